//! Resource pool policy and allocator agent.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use shared_bus::{Message, MessageBus, Participant, ParticipantId};
use shared_types::agents;
use shared_types::ipc::{
    self, msg_type, Complexity, Priority, ReleaseResources, ResourceAllocated,
    ResourceAllocationFailed, ResourceRequest, ResourceShortage, ResourceUsage,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Total pool capacity.
pub const POOL_CAPACITY: ResourceUsage = ResourceUsage {
    cpu_units: 1000,
    memory_mb: 8192,
    network_bandwidth: 1000,
};

/// Refused allocation: what was asked for versus what was left.
#[derive(Debug, Clone, Copy)]
pub struct Shortage {
    pub required: ResourceUsage,
    pub available: ResourceUsage,
}

/// Bounded resource pool with per-transaction grants.
///
/// Grants are sized from the request's priority and complexity and held
/// until explicitly released. Double allocation for one transaction id is
/// refused outright rather than granted twice.
pub struct ResourcePool {
    available: ResourceUsage,
    allocations: HashMap<Uuid, ResourceUsage>,
}

impl Default for ResourcePool {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourcePool {
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: POOL_CAPACITY,
            allocations: HashMap::new(),
        }
    }

    /// Size a grant from the request hints.
    #[must_use]
    pub fn requirement(priority: Priority, complexity: Complexity) -> ResourceUsage {
        let base = match priority {
            Priority::High => ResourceUsage {
                cpu_units: 20,
                memory_mb: 512,
                network_bandwidth: 50,
            },
            Priority::Normal => ResourceUsage {
                cpu_units: 10,
                memory_mb: 256,
                network_bandwidth: 25,
            },
            Priority::Low => ResourceUsage {
                cpu_units: 5,
                memory_mb: 128,
                network_bandwidth: 10,
            },
        };
        let scale = |units: u32| match complexity {
            Complexity::Low => units,
            Complexity::Medium => units * 3 / 2,
            Complexity::High => units * 2,
        };
        ResourceUsage {
            cpu_units: scale(base.cpu_units),
            memory_mb: scale(base.memory_mb),
            network_bandwidth: scale(base.network_bandwidth),
        }
    }

    /// Try to allocate for a transaction. `Err` is a refusal, not a fault.
    pub fn allocate(
        &mut self,
        transaction_id: Uuid,
        priority: Priority,
        complexity: Complexity,
    ) -> Result<ResourceUsage, Shortage> {
        let required = Self::requirement(priority, complexity);
        if self.allocations.contains_key(&transaction_id) || !self.fits(required) {
            return Err(Shortage {
                required,
                available: self.available,
            });
        }

        self.available.cpu_units -= required.cpu_units;
        self.available.memory_mb -= required.memory_mb;
        self.available.network_bandwidth -= required.network_bandwidth;
        self.allocations.insert(transaction_id, required);
        Ok(required)
    }

    /// Return a grant to the pool. Unknown ids are ignored.
    pub fn release(&mut self, transaction_id: Uuid) -> Option<ResourceUsage> {
        let grant = self.allocations.remove(&transaction_id)?;
        self.available.cpu_units += grant.cpu_units;
        self.available.memory_mb += grant.memory_mb;
        self.available.network_bandwidth += grant.network_bandwidth;
        Some(grant)
    }

    /// Resources currently unallocated.
    #[must_use]
    pub fn available(&self) -> ResourceUsage {
        self.available
    }

    /// Number of live grants.
    #[must_use]
    pub fn active_allocations(&self) -> usize {
        self.allocations.len()
    }

    fn fits(&self, required: ResourceUsage) -> bool {
        required.cpu_units <= self.available.cpu_units
            && required.memory_mb <= self.available.memory_mb
            && required.network_bandwidth <= self.available.network_bandwidth
    }
}

/// The resource allocator, registered on the bus as `resource_allocator`.
#[derive(Clone)]
pub struct ResourceAgent {
    bus: Arc<MessageBus>,
    id: ParticipantId,
    pool: Arc<Mutex<ResourcePool>>,
}

impl ResourceAgent {
    /// Create the agent and register it on the bus.
    #[must_use]
    pub fn new(bus: Arc<MessageBus>) -> Self {
        let agent = Self {
            bus: bus.clone(),
            id: agents::RESOURCE_ALLOCATOR.into(),
            pool: Arc::new(Mutex::new(ResourcePool::new())),
        };
        bus.register(agent.clone());
        info!(agent = %agent.id, "resource agent initialized");
        agent
    }

    /// Resources currently unallocated.
    #[must_use]
    pub fn available(&self) -> ResourceUsage {
        self.pool.lock().available()
    }

    /// Number of live grants.
    #[must_use]
    pub fn active_allocations(&self) -> usize {
        self.pool.lock().active_allocations()
    }

    fn on_resource_request(&self, message: &Message, request: ResourceRequest) {
        let outcome = self.pool.lock().allocate(
            request.transaction_id,
            request.processing_priority,
            request.estimated_complexity,
        );

        match outcome {
            Ok(granted) => {
                info!(
                    transaction_id = %request.transaction_id,
                    cpu_units = granted.cpu_units,
                    memory_mb = granted.memory_mb,
                    "resources allocated"
                );
                self.bus.send(
                    &self.id,
                    &message.sender,
                    msg_type::RESOURCE_ALLOCATED,
                    ipc::to_payload(&ResourceAllocated {
                        transaction_id: request.transaction_id,
                        allocated: true,
                        granted,
                    }),
                    message.correlation_id,
                );
            }
            Err(shortage) => {
                warn!(
                    transaction_id = %request.transaction_id,
                    "insufficient resources, allocation refused"
                );
                self.bus.send(
                    &self.id,
                    &message.sender,
                    msg_type::RESOURCE_ALLOCATION_FAILED,
                    ipc::to_payload(&ResourceAllocationFailed {
                        transaction_id: request.transaction_id,
                        allocated: false,
                        reason: "Insufficient resources available".to_string(),
                        required: shortage.required,
                        available: shortage.available,
                    }),
                    message.correlation_id,
                );
                self.bus.send(
                    &self.id,
                    &agents::AUDIT_AGENT.into(),
                    msg_type::RESOURCE_SHORTAGE,
                    ipc::to_payload(&ResourceShortage {
                        transaction_id: request.transaction_id,
                        timestamp: Utc::now(),
                        required: shortage.required,
                        available: shortage.available,
                    }),
                    message.correlation_id,
                );
            }
        }
    }
}

#[async_trait]
impl Participant for ResourceAgent {
    fn id(&self) -> ParticipantId {
        self.id.clone()
    }

    async fn handle(&mut self, message: Message) {
        match message.message_type.as_str() {
            msg_type::RESOURCE_REQUEST => {
                match ipc::from_payload::<ResourceRequest>(&message.payload) {
                    Ok(request) => self.on_resource_request(&message, request),
                    Err(e) => warn!(error = %e, "malformed resource_request dropped"),
                }
            }
            msg_type::RELEASE_RESOURCES => {
                match ipc::from_payload::<ReleaseResources>(&message.payload) {
                    Ok(release) => {
                        if self.pool.lock().release(release.transaction_id).is_some() {
                            debug!(
                                transaction_id = %release.transaction_id,
                                "resources released"
                            );
                        }
                    }
                    Err(e) => warn!(error = %e, "malformed release_resources dropped"),
                }
            }
            other => {
                debug!(message_type = other, "ignoring unknown message type");
            }
        }
    }
}
