//! Criterion benchmarks for u-cloudsched.
//!
//! Synthetic instances (uniform clouds, a mix of services and tasks with
//! chain dependencies) measure the feasibility gate, the deployment
//! simulator and short strategy runs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::Rng;
use u_cloudsched::deploy::{acceptable, deploy_with_timeline};
use u_cloudsched::ga::{GaConfig, Genetic};
use u_cloudsched::haga::{Haga, HagaConfig};
use u_cloudsched::model::{
    Application, Cloud, Cpu, Dependence, NetCondition, Requests, Resources, ServiceRequest,
    TaskRequest,
};
use u_cloudsched::nsga2::{Nsga2, Nsga2Config};
use u_cloudsched::random::create_rng;
use u_cloudsched::Scheduler;

// ===========================================================================
// Synthetic instances
// ===========================================================================

fn instance(num_clouds: usize, num_apps: usize) -> (Vec<Cloud>, Vec<Application>) {
    let mut rng = create_rng(7);
    let clouds: Vec<Cloud> = (0..num_clouds)
        .map(|c| {
            let peers = (0..num_clouds)
                .map(|p| {
                    let rtt = if p == c { 0.5 } else { rng.random_range(5.0..80.0) };
                    NetCondition::new(rtt, 1e9)
                })
                .collect();
            Cloud::new(
                format!("cloud-{c}"),
                Resources::new(Cpu::new(32.0, 2.5), 64e9, 1e12, rng.random_range(2.0..30.0)),
            )
            .with_peers(peers)
            .with_image_path(NetCondition::new(20.0, 1e8))
            .with_controller_path(NetCondition::new(10.0, 5e7))
        })
        .collect();

    let apps: Vec<Application> = (0..num_apps)
        .map(|i| {
            let priority = (num_apps - i) as u32 * 10;
            let requests = Requests::new(
                rng.random_range(1.0..8.0),
                rng.random_range(1e9..8e9),
                rng.random_range(1e9..5e10),
                rng.random_range(20.0..100.0),
            );
            let app = if i % 2 == 0 {
                Application::service(
                    format!("svc-{i}"),
                    priority,
                    ServiceRequest {
                        requests,
                        stable_work: rng.random_range(10.0..100.0),
                        input_data_size: 1e7,
                    },
                )
            } else {
                Application::task(
                    format!("task-{i}"),
                    priority,
                    TaskRequest {
                        requests,
                        task_work: rng.random_range(100.0..1000.0),
                        input_data_size: 1e8,
                    },
                )
            };
            let app = app.with_image_size(5e8);
            if i % 3 == 2 {
                app.with_depend(vec![Dependence::on(i - 1)])
            } else {
                app
            }
        })
        .collect();

    (clouds, apps)
}

fn first_fit_genes(clouds: &[Cloud], apps: &[Application]) -> Vec<usize> {
    (0..apps.len()).map(|i| i % clouds.len()).collect()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");

    for (clouds_n, apps_n) in [(5usize, 50usize), (10, 200), (20, 500)] {
        let (clouds, apps) = instance(clouds_n, apps_n);
        let genes = first_fit_genes(&clouds, &apps);
        let id = format!("c{clouds_n}_a{apps_n}");

        group.bench_with_input(BenchmarkId::new("acceptable", &id), &genes, |b, g| {
            b.iter(|| acceptable(black_box(&clouds), black_box(&apps), black_box(g)))
        });
        group.bench_with_input(BenchmarkId::new("deploy_with_timeline", &id), &genes, |b, g| {
            b.iter(|| {
                deploy_with_timeline(black_box(&clouds), black_box(&apps), black_box(g), None)
            })
        });
    }
    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("strategies");
    group.sample_size(10);

    let (clouds, apps) = instance(8, 60);
    let ga = GaConfig::default()
        .with_population_size(40)
        .with_max_iterations(20)
        .with_seed(42);

    group.bench_function("genetic", |b| {
        b.iter(|| {
            let mut s = Genetic::new(ga.clone());
            black_box(s.schedule(&clouds, &apps))
        })
    });
    group.bench_function("nsga2", |b| {
        b.iter(|| {
            let mut s = Nsga2::new(Nsga2Config::default().with_ga(ga.clone()));
            black_box(s.schedule(&clouds, &apps))
        })
    });
    group.bench_function("haga", |b| {
        b.iter(|| {
            let mut s = Haga::new(HagaConfig::default().with_ga(ga.clone()));
            black_box(s.schedule(&clouds, &apps))
        })
    });
    group.finish();
}

criterion_group!(benches, bench_simulation, bench_strategies);
criterion_main!(benches);
