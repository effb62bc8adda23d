//! Host-facing policy adapter.
//!
//! A host storage stack drives scheduling through a table of operations per
//! policy, looked up by name. [`Elevator`] is that operation table, [`ElevatorType`]
//! pairs a name with its constructor, and [`Registry`] is the host's policy list.
//! Constructing an elevator is the per-device init hook; dropping it is the exit
//! hook. The scheduling core in [`crate::sched`] knows nothing about any of this.

mod error;

pub use error::{RegistryError, Result};

use crate::constants::{ELEVATOR_NAME, ELEVATOR_NAME_MAX};
use crate::sched::{Counters, Options, Request, Sstf};
use core::fmt;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Operations a host invokes on the policy attached to one device queue.
///
/// The host holds its queue lock across every call.
pub trait Elevator: Send + fmt::Debug {
    fn name(&self) -> &'static str;

    /// A new request arrived for the device.
    fn add_request(&mut self, request: Request);

    /// Next request to hand to the device, or `None` if nothing is queued.
    fn dispatch(&mut self, force: bool) -> Option<Request>;

    /// `next` was coalesced into `request` and must leave the queue undispatched.
    fn merged_requests(&mut self, request: &Request, next: &Request);

    fn former_request(&self, request: &Request) -> Option<Request>;

    fn latter_request(&self, request: &Request) -> Option<Request>;

    fn queued(&self) -> u32;
}

/// A named policy and its per-device constructor.
#[derive(Clone, Copy)]
pub struct ElevatorType {
    pub name: &'static str,
    pub init: fn(&Options) -> Box<dyn Elevator>,
}

impl fmt::Debug for ElevatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevatorType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl ElevatorType {
    pub const SSTF: ElevatorType = ElevatorType {
        name: ELEVATOR_NAME,
        init: SstfElevator::boxed,
    };
}

fn validate_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "empty"
    } else if name.len() > ELEVATOR_NAME_MAX {
        "too long"
    } else if !name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        "unsupported character"
    } else {
        return Ok(());
    };

    Err(RegistryError::InvalidName {
        name: name.to_owned(),
        reason,
    })
}

/// Policies available to the host, by name.
#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<&'static str, ElevatorType>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the builtin SSTF policy.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry
            .types
            .insert(ElevatorType::SSTF.name, ElevatorType::SSTF);
        registry
    }

    pub fn register(&mut self, elevator_type: ElevatorType) -> Result<()> {
        validate_name(elevator_type.name)?;

        if self.types.contains_key(elevator_type.name) {
            return Err(RegistryError::AlreadyRegistered(
                elevator_type.name.to_owned(),
            ));
        }
        self.types.insert(elevator_type.name, elevator_type);

        info!(elevator = elevator_type.name, "elevator registered");
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Result<ElevatorType> {
        let elevator_type = self
            .types
            .remove(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))?;

        info!(elevator = name, "elevator unregistered");
        Ok(elevator_type)
    }

    pub fn get(&self, name: &str) -> Option<&ElevatorType> {
        self.types.get(name)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    /// Attaches a fresh instance of policy `name` to a device.
    pub fn init(&self, name: &str, options: &Options) -> Result<Box<dyn Elevator>> {
        let elevator_type = self
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_owned()))?;

        Ok((elevator_type.init)(options))
    }
}

/// SSTF policy bound to one device queue.
#[derive(Debug)]
pub struct SstfElevator {
    sched: Sstf,
}

impl SstfElevator {
    pub fn new(options: &Options) -> Self {
        debug!(
            target: "sstf",
            initial_head = options.initial_head,
            "elevator init"
        );

        Self {
            sched: Sstf::new(*options),
        }
    }

    pub fn boxed(options: &Options) -> Box<dyn Elevator> {
        Box::new(Self::new(options))
    }

    pub fn scheduler(&self) -> &Sstf {
        &self.sched
    }

    pub fn counters(&self) -> Counters {
        self.sched.counters()
    }
}

impl Elevator for SstfElevator {
    fn name(&self) -> &'static str {
        ELEVATOR_NAME
    }

    fn add_request(&mut self, request: Request) {
        self.sched.admit(request);
    }

    fn dispatch(&mut self, force: bool) -> Option<Request> {
        self.sched.dispatch(force)
    }

    fn merged_requests(&mut self, request: &Request, next: &Request) {
        self.sched.withdraw(request.id(), next.id());
    }

    fn former_request(&self, request: &Request) -> Option<Request> {
        self.sched.former(request.id())
    }

    fn latter_request(&self, request: &Request) -> Option<Request> {
        self.sched.latter(request.id())
    }

    fn queued(&self) -> u32 {
        self.sched.len()
    }
}

impl Drop for SstfElevator {
    fn drop(&mut self) {
        let counters = self.sched.counters();
        debug!(
            target: "sstf",
            queued = self.sched.len(),
            dispatched = counters.dispatched,
            seek_distance = counters.seek_distance,
            "elevator exit"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::RequestId;

    fn sstf_init(options: &Options) -> Box<dyn Elevator> {
        SstfElevator::boxed(options)
    }

    #[test]
    fn builtin_contains_sstf() {
        let registry = Registry::with_builtin();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["sstf"]);
        assert!(registry.get("sstf").is_some());
        assert!(registry.get("noop").is_none());
    }

    #[test]
    fn register_duplicate_fails() {
        let mut registry = Registry::with_builtin();
        assert_eq!(
            registry.register(ElevatorType::SSTF),
            Err(RegistryError::AlreadyRegistered("sstf".to_owned()))
        );
    }

    #[test]
    fn register_then_unregister() {
        let mut registry = Registry::new();
        let custom = ElevatorType {
            name: "sstf-alt",
            init: sstf_init,
        };
        registry.register(custom).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["sstf-alt"]);

        let removed = registry.unregister("sstf-alt").unwrap();
        assert_eq!(removed.name, "sstf-alt");
        assert_eq!(
            registry.unregister("sstf-alt").unwrap_err(),
            RegistryError::NotRegistered("sstf-alt".to_owned())
        );
    }

    #[test]
    fn invalid_names_rejected() {
        let mut registry = Registry::new();
        for (name, reason) in [
            ("", "empty"),
            ("a-very-long-policy-name", "too long"),
            ("dead line", "unsupported character"),
        ] {
            let err = registry
                .register(ElevatorType {
                    name,
                    init: sstf_init,
                })
                .unwrap_err();
            assert_eq!(
                err,
                RegistryError::InvalidName {
                    name: name.to_owned(),
                    reason,
                }
            );
        }
        assert_eq!(registry.names().count(), 0);
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            RegistryError::NotRegistered("cfq".to_owned()).to_string(),
            "elevator `cfq` is not registered"
        );
        assert_eq!(
            RegistryError::InvalidName {
                name: String::new(),
                reason: "empty",
            }
            .to_string(),
            "invalid elevator name ``: empty"
        );
    }

    #[test]
    fn init_unknown_fails() {
        let registry = Registry::with_builtin();
        let err = registry.init("deadline", &Options::default()).unwrap_err();
        assert_eq!(err, RegistryError::NotRegistered("deadline".to_owned()));
    }

    #[test]
    fn operations_through_trait_object() {
        crate::test_utils::init_tracing();

        let registry = Registry::with_builtin();
        let mut elevator = registry.init("sstf", &Options::default()).unwrap();
        assert_eq!(elevator.name(), "sstf");

        let a = Request::from_len(RequestId(1), 100, 8);
        let b = Request::from_len(RequestId(2), 108, 8);
        let c = Request::from_len(RequestId(3), 300, 8);
        for request in [a, b, c] {
            elevator.add_request(request);
        }
        assert_eq!(elevator.queued(), 3);
        assert_eq!(elevator.latter_request(&a), Some(b));
        assert_eq!(elevator.former_request(&b), Some(a));

        // Host coalesced b into a.
        elevator.merged_requests(&a, &b);
        assert_eq!(elevator.queued(), 2);
        assert_eq!(elevator.latter_request(&a), Some(c));

        assert_eq!(elevator.dispatch(false), Some(a));
        assert_eq!(elevator.dispatch(true), Some(c));
        assert_eq!(elevator.dispatch(true), None);
    }

    #[test]
    fn separate_devices_are_independent() {
        let registry = Registry::with_builtin();
        let mut sda = registry.init("sstf", &Options::default()).unwrap();
        let mut sdb = registry.init("sstf", &Options { initial_head: 1_000 }).unwrap();

        for elevator in [&mut sda, &mut sdb] {
            elevator.add_request(Request::new(RequestId(1), 900, 900));
            elevator.add_request(Request::new(RequestId(2), 100, 100));
        }

        assert_eq!(sda.dispatch(false).map(|r| r.id()), Some(RequestId(2)));
        assert_eq!(sdb.dispatch(false).map(|r| r.id()), Some(RequestId(1)));
    }
}
