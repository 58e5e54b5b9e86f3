use super::value::ObjectValue;
use alloc::{borrow::Cow, boxed::Box, vec::Vec};
use core::fmt;

/// Represents a single entry in the Object Dictionary.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Variable(ObjectValue),
    /// Sub-index 0 is implicit and always reports the element count.
    Array(Vec<ObjectValue>),
    Record(Vec<ObjectValue>),
}

/// Highest number of sub-entries an array or record may hold, so that
/// sub-index 0 and the reported sub-number both fit in a byte.
pub const MAX_SUB_ENTRIES: usize = 254;

/// Element count as reported at sub-index 0. Objects built directly with
/// more than `MAX_SUB_ENTRIES` elements report `u8::MAX`.
fn element_count(values: &[ObjectValue]) -> u8 {
    u8::try_from(values.len()).unwrap_or(u8::MAX)
}

/// Defines the access rights for an Object Dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    /// read only access
    ReadOnly,
    /// write only access
    WriteOnly,
    /// read and write access
    ReadWrite,
    /// read only access, value is constant
    Constant,
}

/// Defines if an object is mandatory or optional.
/// (Reference: CiA 301, Section 7.4.3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Mandatory,
    Optional,
    Conditional,
}

/// Represents a range of valid values for an object.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueRange {
    pub min: ObjectValue,
    pub max: ObjectValue,
}

/// Callback invoked with the committed value after a successful write.
pub type UpdateCallback = Box<dyn FnMut(&ObjectValue)>;

pub(crate) struct Listener {
    pub(crate) id: u32,
    pub(crate) sub_index: u8,
    pub(crate) callback: UpdateCallback,
}

/// Identifies a registered update listener.
///
/// Handles are unique per dictionary, so a handle to a removed entry never
/// matches a listener registered on a later entry at the same index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    pub index: u16,
    pub sub_index: u8,
    pub(crate) id: u32,
}

/// A complete entry in the Object Dictionary, containing both the data and its metadata.
pub struct ObjectEntry {
    /// The actual data.
    pub object: Object,
    /// A descriptive name for the object.
    pub name: &'static str,
    /// The category of the object (Mandatory, Optional, etc.).
    pub category: Category,
    /// The access rights for this object, applied to every sub-index.
    /// `None` is treated as read-write.
    pub access: Option<AccessType>,
    /// The valid value range for this object.
    pub value_range: Option<ValueRange>,
    pub(crate) listeners: Vec<Listener>,
}

impl fmt::Debug for ObjectEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectEntry")
            .field("object", &self.object)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("access", &self.access)
            .field("value_range", &self.value_range)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ObjectEntry {
    fn with_object(name: &'static str, object: Object, access: AccessType) -> Self {
        Self {
            object,
            name,
            category: Category::Optional,
            access: Some(access),
            value_range: None,
            listeners: Vec::new(),
        }
    }

    pub fn variable(name: &'static str, value: ObjectValue, access: AccessType) -> Self {
        Self::with_object(name, Object::Variable(value), access)
    }

    pub fn array(name: &'static str, values: Vec<ObjectValue>, access: AccessType) -> Self {
        Self::with_object(name, Object::Array(values), access)
    }

    pub fn record(name: &'static str, values: Vec<ObjectValue>, access: AccessType) -> Self {
        Self::with_object(name, Object::Record(values), access)
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = category;
        self
    }

    pub fn with_range(mut self, min: ObjectValue, max: ObjectValue) -> Self {
        self.value_range = Some(ValueRange { min, max });
        self
    }

    /// Reads the value stored at `sub_index`.
    /// For arrays and records, sub-index 0 yields the element count.
    pub fn value(&self, sub_index: u8) -> Option<Cow<'_, ObjectValue>> {
        match &self.object {
            Object::Variable(value) => (sub_index == 0).then_some(Cow::Borrowed(value)),
            Object::Array(values) | Object::Record(values) => {
                if sub_index == 0 {
                    Some(Cow::Owned(ObjectValue::Unsigned8(element_count(values))))
                } else {
                    values.get(sub_index as usize - 1).map(Cow::Borrowed)
                }
            }
        }
    }

    /// Number of sub-entries including the count at sub-index 0.
    /// `None` for single-value objects, which have no sub-entries.
    pub fn sub_number(&self) -> Option<u8> {
        match &self.object {
            Object::Variable(_) => None,
            Object::Array(values) | Object::Record(values) => {
                Some(element_count(values).saturating_add(1))
            }
        }
    }

    /// Encoded size in bytes of the value at `sub_index`.
    pub fn raw_size(&self, sub_index: u8) -> Option<usize> {
        self.value(sub_index).map(|v| v.serialize().len())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
