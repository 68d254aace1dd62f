use crate::engine::types::{Literal, PortKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// Unique identity of a port, stable for the port's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortId(Uuid);

impl PortId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scalar payload that a port can carry
///
/// Values are stored as raw bits in an atomic word so one module can write
/// its outputs while modules in later stages read them from other threads.
pub trait PortValue: Copy + Send + Sync + 'static {
    const KIND: PortKind;

    fn to_bits(self) -> u64;

    fn from_bits(bits: u64) -> Self;

    /// Extract a typed port from an erased handle, if the kinds agree
    fn from_handle(handle: &PortHandle) -> Option<Arc<Port<Self>>>;

    fn into_handle(port: Arc<Port<Self>>) -> PortHandle;
}

impl PortValue for f64 {
    const KIND: PortKind = PortKind::Double;

    fn to_bits(self) -> u64 {
        f64::to_bits(self)
    }

    fn from_bits(bits: u64) -> Self {
        f64::from_bits(bits)
    }

    fn from_handle(handle: &PortHandle) -> Option<Arc<Port<Self>>> {
        match handle {
            PortHandle::Double(port) => Some(Arc::clone(port)),
            _ => None,
        }
    }

    fn into_handle(port: Arc<Port<Self>>) -> PortHandle {
        PortHandle::Double(port)
    }
}

impl PortValue for bool {
    const KIND: PortKind = PortKind::Gate;

    fn to_bits(self) -> u64 {
        self as u64
    }

    fn from_bits(bits: u64) -> Self {
        bits != 0
    }

    fn from_handle(handle: &PortHandle) -> Option<Arc<Port<Self>>> {
        match handle {
            PortHandle::Gate(port) => Some(Arc::clone(port)),
            _ => None,
        }
    }

    fn into_handle(port: Arc<Port<Self>>) -> PortHandle {
        PortHandle::Gate(port)
    }
}

/// Single-value cell written by its owning module once per tick
pub struct Port<T: PortValue> {
    id: PortId,
    bits: AtomicU64,
    _value: PhantomData<T>,
}

impl<T: PortValue> Port<T> {
    pub fn new(initial: T) -> Self {
        Self {
            id: PortId::new(),
            bits: AtomicU64::new(initial.to_bits()),
            _value: PhantomData,
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn kind(&self) -> PortKind {
        T::KIND
    }

    /// Read the current value
    pub fn get(&self) -> T {
        T::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Overwrite the current value
    pub fn set(&self, value: T) {
        self.bits.store(value.to_bits(), Ordering::Release);
    }
}

impl<T: PortValue + fmt::Debug> fmt::Debug for Port<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Port")
            .field("id", &self.id)
            .field("kind", &T::KIND)
            .field("value", &self.get())
            .finish()
    }
}

pub type DoublePort = Port<f64>;
pub type GatePort = Port<bool>;

/// Shared handle to a port of any kind
#[derive(Debug, Clone)]
pub enum PortHandle {
    Double(Arc<DoublePort>),
    Gate(Arc<GatePort>),
}

impl PortHandle {
    /// Allocate a fresh zero-valued port of the given kind
    pub fn new(kind: PortKind) -> Self {
        match kind {
            PortKind::Double => PortHandle::Double(Arc::new(Port::new(0.0))),
            PortKind::Gate => PortHandle::Gate(Arc::new(Port::new(false))),
        }
    }

    pub fn kind(&self) -> PortKind {
        match self {
            PortHandle::Double(_) => PortKind::Double,
            PortHandle::Gate(_) => PortKind::Gate,
        }
    }

    pub fn id(&self) -> PortId {
        match self {
            PortHandle::Double(port) => port.id(),
            PortHandle::Gate(port) => port.id(),
        }
    }

    /// Typed view of this handle
    pub fn typed<T: PortValue>(&self) -> Option<Arc<Port<T>>> {
        T::from_handle(self)
    }

    /// Whether both handles point at the same port
    pub fn same_port(&self, other: &PortHandle) -> bool {
        self.id() == other.id()
    }

    /// Snapshot of the current value as a literal
    pub fn value(&self) -> Literal {
        match self {
            PortHandle::Double(port) => Literal::Number(port.get()),
            PortHandle::Gate(port) => Literal::Flag(port.get()),
        }
    }
}

impl From<f64> for PortHandle {
    fn from(value: f64) -> Self {
        PortHandle::Double(Arc::new(Port::new(value)))
    }
}

impl From<bool> for PortHandle {
    fn from(value: bool) -> Self {
        PortHandle::Gate(Arc::new(Port::new(value)))
    }
}
