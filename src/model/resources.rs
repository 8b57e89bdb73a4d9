//! Cloud-side resource model.
//!
//! A [`Cloud`] carries three [`Resources`] views: `capacity` (the immutable
//! baseline), `allocatable` (capacity minus commitments outside the current
//! batch) and `tmp_alloc` (scratch for a single evaluation). CPU is
//! compressible and may go negative in `allocatable`; memory and storage are
//! incompressible.

use serde::{Deserialize, Serialize};

/// CPU capacity or allocatable amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cpu {
    /// Number of logical cores.
    pub logical_cores: f64,
    /// Base clock in GHz.
    pub base_clock: f64,
}

impl Cpu {
    /// Creates a CPU description.
    pub fn new(logical_cores: f64, base_clock: f64) -> Self {
        Self {
            logical_cores,
            base_clock,
        }
    }
}

/// Network conditions on one path: round-trip time and downstream bandwidth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetCondition {
    /// Round-trip time in ms.
    pub rtt: f64,
    /// Downstream bandwidth in bytes per second.
    pub down_bw: f64,
}

impl NetCondition {
    /// Creates a network condition.
    pub fn new(rtt: f64, down_bw: f64) -> Self {
        Self { rtt, down_bw }
    }

    /// Seconds needed to transfer `bytes` over this path, including one RTT.
    ///
    /// Returns `f64::INFINITY` when the path has no bandwidth but data has to
    /// be moved.
    pub fn transfer_time(&self, bytes: f64) -> f64 {
        let rtt_s = self.rtt / 1000.0;
        if bytes <= 0.0 {
            rtt_s
        } else if self.down_bw <= 0.0 {
            f64::INFINITY
        } else {
            rtt_s + bytes / self.down_bw
        }
    }
}

/// A resource vector for a cloud.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resources {
    /// Compressible CPU.
    pub cpu: Cpu,
    /// Memory in bytes.
    pub memory: f64,
    /// Storage in bytes.
    pub storage: f64,
    /// Latency to end users in ms.
    pub net_latency: f64,
}

impl Resources {
    /// Creates a resource vector.
    pub fn new(cpu: Cpu, memory: f64, storage: f64, net_latency: f64) -> Self {
        Self {
            cpu,
            memory,
            storage,
            net_latency,
        }
    }

    /// Whether an incompressible resource is negative.
    pub fn overcommitted(&self) -> bool {
        self.memory < 0.0 || self.storage < 0.0
    }
}

/// One cloud site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cloud {
    /// Human-readable name.
    #[serde(default)]
    pub name: String,
    /// Immutable baseline.
    pub capacity: Resources,
    /// Capacity minus current commitments.
    pub allocatable: Resources,
    /// Scratch copy used during one evaluation.
    #[serde(default)]
    pub tmp_alloc: Resources,
    /// Network conditions to every cloud, indexed by cloud. The entry for
    /// this cloud describes intra-cloud traffic.
    #[serde(default)]
    pub net_condition_clouds: Vec<NetCondition>,
    /// Path to the image repository.
    #[serde(default)]
    pub net_condition_image: NetCondition,
    /// Path to the controller (source of input data).
    #[serde(default)]
    pub net_condition_controller: NetCondition,
    /// Queue of application indices deployed here, in deployment order.
    #[serde(default)]
    pub running_apps: Vec<usize>,
}

impl Cloud {
    /// Creates a cloud whose allocatable resources equal its capacity.
    pub fn new(name: impl Into<String>, capacity: Resources) -> Self {
        Self {
            name: name.into(),
            capacity,
            allocatable: capacity,
            tmp_alloc: capacity,
            net_condition_clouds: Vec::new(),
            net_condition_image: NetCondition::default(),
            net_condition_controller: NetCondition::default(),
            running_apps: Vec::new(),
        }
    }

    /// Sets the network conditions to peer clouds.
    pub fn with_peers(mut self, peers: Vec<NetCondition>) -> Self {
        self.net_condition_clouds = peers;
        self
    }

    /// Sets the image repository path.
    pub fn with_image_path(mut self, net: NetCondition) -> Self {
        self.net_condition_image = net;
        self
    }

    /// Sets the controller path.
    pub fn with_controller_path(mut self, net: NetCondition) -> Self {
        self.net_condition_controller = net;
        self
    }

    /// RTT in ms from this cloud to `peer`. Missing entries count as 0.
    pub fn rtt_to(&self, peer: usize) -> f64 {
        self.net_condition_clouds
            .get(peer)
            .map(|n| n.rtt)
            .unwrap_or(0.0)
    }
}

/// Deep copy of a cloud list.
///
/// Cloud values own all their data, so a clone is already structurally
/// independent of the source.
pub fn clouds_copy(clouds: &[Cloud]) -> Vec<Cloud> {
    clouds.to_vec()
}
