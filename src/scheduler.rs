//! The interface shared by every scheduling strategy.

use crate::error::Result;
use crate::model::{Application, Cloud, Solution};

/// A placement strategy.
///
/// Implementations borrow the inputs immutably and return a solution with
/// one gene per application: a cloud index, or `clouds.len()` for a
/// rejected application. Strategies keep per-run reporting data (traces)
/// behind `&mut self`, which is why `schedule` takes a mutable receiver.
///
/// # Examples
///
/// ```
/// use u_cloudsched::heuristics::FirstFit;
/// use u_cloudsched::model::{Application, Cloud, Cpu, Requests, Resources, ServiceRequest};
/// use u_cloudsched::Scheduler;
///
/// let clouds = vec![Cloud::new("edge", Resources::new(Cpu::new(8.0, 2.0), 1e9, 1e10, 5.0))];
/// let apps = vec![Application::service(
///     "web",
///     10,
///     ServiceRequest {
///         requests: Requests::new(2.0, 1e8, 1e9, 50.0),
///         ..Default::default()
///     },
/// )];
///
/// let mut scheduler = FirstFit;
/// let solution = scheduler.schedule(&clouds, &apps).unwrap();
/// assert_eq!(solution.scheduling_result, vec![0]);
/// ```
pub trait Scheduler {
    /// Short strategy name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Places every application.
    fn schedule(&mut self, clouds: &[Cloud], apps: &[Application]) -> Result<Solution>;
}
