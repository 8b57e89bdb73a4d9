//! Application model: services, tasks, dependencies and migration state.

use serde::{Deserialize, Serialize};

/// Resource requests shared by services and tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requests {
    /// Requested logical cores.
    pub cpu: f64,
    /// Memory in bytes.
    pub memory: f64,
    /// Storage in bytes.
    pub storage: f64,
    /// Maximum tolerated user latency in ms.
    pub net_latency: f64,
}

impl Requests {
    /// Creates a request vector.
    pub fn new(cpu: f64, memory: f64, storage: f64, net_latency: f64) -> Self {
        Self {
            cpu,
            memory,
            storage,
            net_latency,
        }
    }
}

/// Request of a long-running service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub requests: Requests,
    /// Giga-cycles of work until the service is stable.
    #[serde(default)]
    pub stable_work: f64,
    /// Bytes of input data pulled from the controller.
    #[serde(default)]
    pub input_data_size: f64,
}

/// Request of a one-shot task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub requests: Requests,
    /// Giga-cycles of computation.
    #[serde(default)]
    pub task_work: f64,
    /// Bytes of input data pulled from the controller.
    #[serde(default)]
    pub input_data_size: f64,
}

/// The request of an application, by variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppRequest {
    Service(ServiceRequest),
    Task(TaskRequest),
}

impl AppRequest {
    /// The resource part of the request.
    pub fn requests(&self) -> &Requests {
        match self {
            AppRequest::Service(s) => &s.requests,
            AppRequest::Task(t) => &t.requests,
        }
    }

    /// Bytes of input data.
    pub fn input_data_size(&self) -> f64 {
        match self {
            AppRequest::Service(s) => s.input_data_size,
            AppRequest::Task(t) => t.input_data_size,
        }
    }
}

/// A dependency edge: this application needs `app_idx`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependence {
    pub app_idx: usize,
    /// Required downstream bandwidth in bytes per second.
    #[serde(default)]
    pub downstream_bandwidth: f64,
    /// Required RTT in ms.
    #[serde(default)]
    pub rtt: f64,
}

impl Dependence {
    /// Dependency on `app_idx` without network requirements.
    pub fn on(app_idx: usize) -> Self {
        Self {
            app_idx,
            ..Self::default()
        }
    }
}

/// Timing outputs of one evaluation, in seconds from the scheduling instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppTiming {
    pub start_time: f64,
    pub image_pull_done_time: f64,
    pub data_input_done_time: f64,
    pub stable_time: f64,
    pub task_completion_time: f64,
}

impl AppTiming {
    /// Whether every field is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// An application to place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ApplicationRepr", into = "ApplicationRepr")]
pub struct Application {
    pub name: String,
    /// Weight in 1..=65535, directly proportional.
    pub priority: u32,
    pub request: AppRequest,
    /// Container image size in bytes.
    pub image_size: f64,
    pub depend: Vec<Dependence>,
    /// New applications may be rejected; remaining ones may not.
    pub is_new: bool,
    pub can_migrate: bool,
    /// Cloud index the application ran on in the previous round.
    pub cloud_remaining_on: usize,
    pub timing: AppTiming,
}

impl Application {
    /// Creates a new (rejectable) service.
    pub fn service(name: impl Into<String>, priority: u32, req: ServiceRequest) -> Self {
        Self::with_request(name, priority, AppRequest::Service(req))
    }

    /// Creates a new (rejectable) task.
    pub fn task(name: impl Into<String>, priority: u32, req: TaskRequest) -> Self {
        Self::with_request(name, priority, AppRequest::Task(req))
    }

    fn with_request(name: impl Into<String>, priority: u32, request: AppRequest) -> Self {
        Self {
            name: name.into(),
            priority,
            request,
            image_size: 0.0,
            depend: Vec::new(),
            is_new: true,
            can_migrate: true,
            cloud_remaining_on: 0,
            timing: AppTiming::default(),
        }
    }

    /// Adds dependencies.
    pub fn with_depend(mut self, depend: Vec<Dependence>) -> Self {
        self.depend = depend;
        self
    }

    /// Sets the image size.
    pub fn with_image_size(mut self, bytes: f64) -> Self {
        self.image_size = bytes;
        self
    }

    /// Marks the application as remaining from the previous round.
    pub fn remaining_on(mut self, cloud: usize, can_migrate: bool) -> Self {
        self.is_new = false;
        self.can_migrate = can_migrate;
        self.cloud_remaining_on = cloud;
        self
    }

    pub fn is_task(&self) -> bool {
        matches!(self.request, AppRequest::Task(_))
    }

    pub fn requests(&self) -> &Requests {
        self.request.requests()
    }

    /// Remaining application that must stay on `cloud_remaining_on`.
    pub fn is_locked(&self) -> bool {
        !self.is_new && !self.can_migrate
    }

    /// Whether the reject sentinel is a legal gene.
    pub fn can_reject(&self) -> bool {
        self.is_new
    }
}

/// Deep copy of an application list.
pub fn apps_copy(apps: &[Application]) -> Vec<Application> {
    apps.to_vec()
}

/// Wire shape: `isTask` selects which of `svcReq` / `taskReq` applies.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationRepr {
    #[serde(default)]
    name: String,
    priority: u32,
    #[serde(default)]
    is_task: bool,
    #[serde(default)]
    svc_req: ServiceRequest,
    #[serde(default)]
    task_req: TaskRequest,
    #[serde(default)]
    image_size: f64,
    #[serde(default)]
    depend: Vec<Dependence>,
    #[serde(default = "default_true")]
    is_new: bool,
    #[serde(default = "default_true")]
    can_migrate: bool,
    #[serde(default)]
    cloud_remaining_on: usize,
    #[serde(default)]
    timing: AppTiming,
}

fn default_true() -> bool {
    true
}

impl From<ApplicationRepr> for Application {
    fn from(r: ApplicationRepr) -> Self {
        let request = if r.is_task {
            AppRequest::Task(r.task_req)
        } else {
            AppRequest::Service(r.svc_req)
        };
        Self {
            name: r.name,
            priority: r.priority,
            request,
            image_size: r.image_size,
            depend: r.depend,
            is_new: r.is_new,
            can_migrate: r.can_migrate,
            cloud_remaining_on: r.cloud_remaining_on,
            timing: r.timing,
        }
    }
}

impl From<Application> for ApplicationRepr {
    fn from(a: Application) -> Self {
        let (is_task, svc_req, task_req) = match a.request {
            AppRequest::Service(s) => (false, s, TaskRequest::default()),
            AppRequest::Task(t) => (true, ServiceRequest::default(), t),
        };
        Self {
            name: a.name,
            priority: a.priority,
            is_task,
            svc_req,
            task_req,
            image_size: a.image_size,
            depend: a.depend,
            is_new: a.is_new,
            can_migrate: a.can_migrate,
            cloud_remaining_on: a.cloud_remaining_on,
            timing: a.timing,
        }
    }
}
