// crates/canopen-rs/src/od/mod.rs

pub mod constants;
mod entry;
mod error_history;
pub mod utils;
mod value;

pub use entry::{
    AccessType, Category, ListenerHandle, MAX_SUB_ENTRIES, Object, ObjectEntry, UpdateCallback,
    ValueRange,
};
pub use error_history::EmcyHistoryEntry;
pub use value::ObjectValue;

use crate::CanOpenError;
use crate::log::{my_debug, my_trace};
use alloc::{borrow::Cow, boxed::Box, collections::BTreeMap};
use core::cmp::Ordering;
use core::fmt;
use entry::Listener;

/// The main Object Dictionary structure.
///
/// Owns every entry exclusively. Services hold indices, never references,
/// and re-resolve them on each access.
#[derive(Default)]
pub struct ObjectDictionary {
    pub(super) entries: BTreeMap<u16, ObjectEntry>,
    next_listener_id: u32,
}

impl fmt::Debug for ObjectDictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDictionary")
            .field("entries", &self.entries)
            .finish()
    }
}

impl ObjectDictionary {
    /// Creates a new, empty OD.
    /// See `utils::new_device_default` for one populated with the
    /// communication objects the protocol services consume.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new object entry into the dictionary at a given index.
    /// A replaced entry is returned with its listeners detached.
    pub fn insert(&mut self, index: u16, entry: ObjectEntry) -> Option<ObjectEntry> {
        self.entries.insert(index, entry).map(|mut old| {
            old.listeners.clear();
            old
        })
    }

    /// Detaches an entry and all its sub-entries. Listeners registered on it
    /// are dropped and will never fire again, even if the entry is re-inserted.
    pub fn remove_entry(&mut self, index: u16) -> Option<ObjectEntry> {
        let mut removed = self.entries.remove(&index)?;
        my_debug!(
            "Removed object {:#06X} ({}), dropping {} listener(s)",
            index,
            removed.name,
            removed.listeners.len()
        );
        removed.listeners.clear();
        Some(removed)
    }

    pub fn get_entry(&self, index: u16) -> Option<&ObjectEntry> {
        self.entries.get(&index)
    }

    pub fn contains(&self, index: u16) -> bool {
        self.entries.contains_key(&index)
    }

    /// Reads a value from the Object Dictionary by index and sub-index.
    pub fn read<'s>(&'s self, index: u16, sub_index: u8) -> Option<Cow<'s, ObjectValue>> {
        self.entries
            .get(&index)
            .and_then(|entry| entry.value(sub_index))
    }

    /// Reads an object's enum (`Object::Variable`, `Object::Array`, etc.) by index.
    pub fn read_object(&self, index: u16) -> Option<&Object> {
        self.entries.get(&index).map(|entry| &entry.object)
    }

    /// Number of sub-entries of an array or record, counting sub-index 0.
    pub fn sub_number(&self, index: u16) -> Option<u8> {
        self.entries.get(&index).and_then(ObjectEntry::sub_number)
    }

    pub fn raw_size(&self, index: u16, sub_index: u8) -> Option<usize> {
        self.entries
            .get(&index)
            .and_then(|entry| entry.raw_size(sub_index))
    }

    // --- Start of Type-Safe Accessors ---
    pub fn read_u8(&self, index: u16, sub_index: u8) -> Option<u8> {
        self.read(index, sub_index).and_then(|cow| {
            if let ObjectValue::Unsigned8(val) = *cow {
                Some(val)
            } else {
                None
            }
        })
    }

    pub fn read_u16(&self, index: u16, sub_index: u8) -> Option<u16> {
        self.read(index, sub_index).and_then(|cow| {
            if let ObjectValue::Unsigned16(val) = *cow {
                Some(val)
            } else {
                None
            }
        })
    }

    pub fn read_u32(&self, index: u16, sub_index: u8) -> Option<u32> {
        self.read(index, sub_index).and_then(|cow| {
            if let ObjectValue::Unsigned32(val) = *cow {
                Some(val)
            } else {
                None
            }
        })
    }

    // --- End of Type-Safe Accessors ---

    /// Public write function that respects access rights.
    pub fn write(
        &mut self,
        index: u16,
        sub_index: u8,
        value: ObjectValue,
    ) -> Result<(), CanOpenError> {
        self.write_internal(index, sub_index, value, true)
    }

    /// Internal write function with an option to bypass access checks.
    /// Device-side updates of read-only objects (e.g. the error register) go
    /// through here with `check_access = false`.
    ///
    /// Type and range are always validated. On success the new value is
    /// committed first, then every listener on `(index, sub_index)` runs in
    /// registration order before this call returns.
    pub fn write_internal(
        &mut self,
        index: u16,
        sub_index: u8,
        value: ObjectValue,
        check_access: bool,
    ) -> Result<(), CanOpenError> {
        let ObjectEntry {
            object,
            access,
            value_range,
            listeners,
            ..
        } = self
            .entries
            .get_mut(&index)
            .ok_or(CanOpenError::ObjectNotFound)?;

        if check_access && matches!(access, Some(AccessType::ReadOnly | AccessType::Constant)) {
            my_debug!("Write to read-only object {:#06X}/{} rejected", index, sub_index);
            return Err(CanOpenError::AccessDenied);
        }

        let slot = match object {
            Object::Variable(v) => {
                if sub_index == 0 {
                    v
                } else {
                    return Err(CanOpenError::SubObjectNotFound);
                }
            }
            Object::Array(values) | Object::Record(values) => {
                if sub_index == 0 {
                    // The count is derived from the populated sub-entries;
                    // use `resize_array` to change it.
                    return Err(CanOpenError::AccessDenied);
                }
                values
                    .get_mut(sub_index as usize - 1)
                    .ok_or(CanOpenError::SubObjectNotFound)?
            }
        };

        if !slot.same_type(&value) {
            my_debug!(
                "Type mismatch writing {:#06X}/{}: have {:?}, got {:?}",
                index, sub_index, slot, value
            );
            return Err(CanOpenError::TypeMismatch);
        }
        if let Some(range) = value_range {
            if value.compare(&range.min) == Some(Ordering::Less)
                || value.compare(&range.max) == Some(Ordering::Greater)
            {
                return Err(CanOpenError::RangeError);
            }
        }

        *slot = value;
        my_trace!("Wrote {:#06X}/{} = {:?}", index, sub_index, slot);

        let committed: &ObjectValue = slot;
        for listener in listeners.iter_mut().filter(|l| l.sub_index == sub_index) {
            (listener.callback)(committed);
        }
        Ok(())
    }

    /// Registers a callback fired after every successful write to
    /// `(index, sub_index)`. The entry and sub-entry must exist.
    pub fn add_listener<F>(
        &mut self,
        index: u16,
        sub_index: u8,
        callback: F,
    ) -> Result<ListenerHandle, CanOpenError>
    where
        F: FnMut(&ObjectValue) + 'static,
    {
        let entry = self
            .entries
            .get_mut(&index)
            .ok_or(CanOpenError::ObjectNotFound)?;
        if entry.value(sub_index).is_none() {
            return Err(CanOpenError::SubObjectNotFound);
        }

        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.wrapping_add(1);
        entry.listeners.push(Listener {
            id,
            sub_index,
            callback: Box::new(callback),
        });
        Ok(ListenerHandle {
            index,
            sub_index,
            id,
        })
    }

    /// Unregisters a listener. Returns `false` if it no longer exists.
    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        let Some(entry) = self.entries.get_mut(&handle.index) else {
            return false;
        };
        let before = entry.listeners.len();
        entry.listeners.retain(|l| l.id != handle.id);
        entry.listeners.len() != before
    }

    /// Appends a sub-entry to an array or record and returns its sub-index.
    /// The value must match the type of the existing elements.
    pub fn push_sub_entry(&mut self, index: u16, value: ObjectValue) -> Result<u8, CanOpenError> {
        let entry = self
            .entries
            .get_mut(&index)
            .ok_or(CanOpenError::ObjectNotFound)?;
        let is_array = matches!(entry.object, Object::Array(_));
        let values = match &mut entry.object {
            Object::Array(values) | Object::Record(values) => values,
            Object::Variable(_) => return Err(CanOpenError::TypeMismatch),
        };
        if values.len() >= MAX_SUB_ENTRIES {
            return Err(CanOpenError::RangeError);
        }
        // Records may mix types, arrays may not.
        if is_array && values.first().is_some_and(|first| !first.same_type(&value)) {
            return Err(CanOpenError::TypeMismatch);
        }
        values.push(value);
        Ok(values.len() as u8)
    }

    /// Grows or shrinks an array object to `len` sub-entries in one step.
    ///
    /// Existing values up to `len` are kept, new slots are filled with
    /// `fill`, and listeners on sub-indices beyond `len` are dropped.
    /// If the count changed, listeners on sub-index 0 receive the new count.
    pub fn resize_array(
        &mut self,
        index: u16,
        len: u8,
        fill: ObjectValue,
    ) -> Result<(), CanOpenError> {
        let entry = self
            .entries
            .get_mut(&index)
            .ok_or(CanOpenError::ObjectNotFound)?;
        if len as usize > MAX_SUB_ENTRIES {
            return Err(CanOpenError::RangeError);
        }
        let Object::Array(values) = &mut entry.object else {
            return Err(CanOpenError::TypeMismatch);
        };
        if values.first().is_some_and(|first| !first.same_type(&fill)) {
            return Err(CanOpenError::TypeMismatch);
        }

        let previous = values.len();
        values.resize(len as usize, fill);
        entry
            .listeners
            .retain(|l| l.sub_index <= len);
        my_debug!("Resized array {:#06X} to {} sub-entries", index, len);
        if previous != len as usize {
            notify_listeners(entry, 0);
        }
        Ok(())
    }
}

/// Runs the listeners on `sub_index` with its current value. Used by
/// structural mutations that change values without going through `write`.
pub(super) fn notify_listeners(entry: &mut ObjectEntry, sub_index: u8) {
    let Some(value) = entry.value(sub_index).map(Cow::into_owned) else {
        return;
    };
    for listener in entry.listeners.iter_mut().filter(|l| l.sub_index == sub_index) {
        (listener.callback)(&value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    fn od_with_var(index: u16, value: ObjectValue, access: AccessType) -> ObjectDictionary {
        let mut od = ObjectDictionary::new();
        od.insert(index, ObjectEntry::variable("TestVar", value, access));
        od
    }

    #[test]
    fn test_read_variable() {
        let od = od_with_var(0x1006, ObjectValue::Unsigned32(12345), AccessType::ReadWrite);
        let value = od.read(0x1006, 0).unwrap();
        assert_eq!(*value, ObjectValue::Unsigned32(12345));
        assert!(od.read(0x1006, 1).is_none());
        assert!(od.get_entry(0x2000).is_none());
    }

    #[test]
    fn test_read_write_array_element() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x2000,
            ObjectEntry::array("TestArray", vec![ObjectValue::Unsigned16(100)], AccessType::ReadWrite),
        );

        od.write(0x2000, 1, ObjectValue::Unsigned16(999)).unwrap();
        assert_eq!(od.read_u16(0x2000, 1), Some(999));
    }

    #[test]
    fn test_read_sub_index_zero_returns_owned_length() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x2000,
            ObjectEntry::array(
                "TestArray",
                vec![ObjectValue::Unsigned16(100), ObjectValue::Unsigned16(200)],
                AccessType::ReadWrite,
            ),
        );

        let value = od.read(0x2000, 0).unwrap();
        assert_eq!(*value, ObjectValue::Unsigned8(2));
        assert!(matches!(value, Cow::Owned(_)));
        assert_eq!(od.sub_number(0x2000), Some(3));
    }

    #[test]
    fn test_write_to_readonly_fails() {
        let mut od = od_with_var(0x1001, ObjectValue::Unsigned8(10), AccessType::ReadOnly);
        let result = od.write(0x1001, 0, ObjectValue::Unsigned8(42));
        assert_eq!(result, Err(CanOpenError::AccessDenied));
        assert_eq!(od.read_u8(0x1001, 0), Some(10));

        // Internal writes bypass the access class.
        od.write_internal(0x1001, 0, ObjectValue::Unsigned8(42), false).unwrap();
        assert_eq!(od.read_u8(0x1001, 0), Some(42));
    }

    #[test]
    fn test_write_to_missing_object_or_sub_index() {
        let mut od = od_with_var(0x1006, ObjectValue::Unsigned32(0), AccessType::ReadWrite);
        assert_eq!(
            od.write(0x1007, 0, ObjectValue::Unsigned32(1)),
            Err(CanOpenError::ObjectNotFound)
        );
        assert_eq!(
            od.write(0x1006, 1, ObjectValue::Unsigned32(1)),
            Err(CanOpenError::SubObjectNotFound)
        );
    }

    #[test]
    fn test_type_mismatch_does_not_notify() {
        let mut od = od_with_var(0x1006, ObjectValue::Unsigned32(0), AccessType::ReadWrite);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        od.add_listener(0x1006, 0, move |_| *counter.borrow_mut() += 1)
            .unwrap();

        let result = od.write(0x1006, 0, ObjectValue::Unsigned16(5));
        assert_eq!(result, Err(CanOpenError::TypeMismatch));
        assert_eq!(*calls.borrow(), 0);
        assert_eq!(od.read_u32(0x1006, 0), Some(0));
    }

    #[test]
    fn test_range_error_does_not_notify() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x1019,
            ObjectEntry::variable("Overflow", ObjectValue::Unsigned8(0), AccessType::ReadWrite)
                .with_range(ObjectValue::Unsigned8(0), ObjectValue::Unsigned8(240)),
        );
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        od.add_listener(0x1019, 0, move |_| *counter.borrow_mut() += 1)
            .unwrap();

        assert_eq!(
            od.write(0x1019, 0, ObjectValue::Unsigned8(241)),
            Err(CanOpenError::RangeError)
        );
        assert_eq!(*calls.borrow(), 0);
        od.write(0x1019, 0, ObjectValue::Unsigned8(240)).unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_listeners_fire_in_registration_order_with_committed_value() {
        let mut od = od_with_var(0x1006, ObjectValue::Unsigned32(0), AccessType::ReadWrite);
        let log: Rc<RefCell<Vec<(u8, ObjectValue)>>> = Rc::new(RefCell::new(Vec::new()));

        let first = log.clone();
        od.add_listener(0x1006, 0, move |v| first.borrow_mut().push((1, v.clone())))
            .unwrap();
        let second = log.clone();
        od.add_listener(0x1006, 0, move |v| second.borrow_mut().push((2, v.clone())))
            .unwrap();

        od.write(0x1006, 0, ObjectValue::Unsigned32(1000)).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                (1, ObjectValue::Unsigned32(1000)),
                (2, ObjectValue::Unsigned32(1000))
            ]
        );
    }

    #[test]
    fn test_listener_only_fires_for_its_sub_index() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x2000,
            ObjectEntry::array(
                "TestArray",
                vec![ObjectValue::Unsigned8(0), ObjectValue::Unsigned8(0)],
                AccessType::ReadWrite,
            ),
        );
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        od.add_listener(0x2000, 2, move |_| *counter.borrow_mut() += 1)
            .unwrap();

        od.write(0x2000, 1, ObjectValue::Unsigned8(1)).unwrap();
        assert_eq!(*calls.borrow(), 0);
        od.write(0x2000, 2, ObjectValue::Unsigned8(1)).unwrap();
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn test_add_listener_requires_existing_target() {
        let mut od = od_with_var(0x1006, ObjectValue::Unsigned32(0), AccessType::ReadWrite);
        assert_eq!(
            od.add_listener(0x1007, 0, |_| {}).unwrap_err(),
            CanOpenError::ObjectNotFound
        );
        assert_eq!(
            od.add_listener(0x1006, 3, |_| {}).unwrap_err(),
            CanOpenError::SubObjectNotFound
        );
    }

    #[test]
    fn test_remove_listener() {
        let mut od = od_with_var(0x1006, ObjectValue::Unsigned32(0), AccessType::ReadWrite);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let handle = od
            .add_listener(0x1006, 0, move |_| *counter.borrow_mut() += 1)
            .unwrap();

        assert!(od.remove_listener(handle));
        assert!(!od.remove_listener(handle));
        od.write(0x1006, 0, ObjectValue::Unsigned32(1)).unwrap();
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_removed_entry_subscriptions_never_fire_again() {
        let mut od = od_with_var(0x1006, ObjectValue::Unsigned32(0), AccessType::ReadWrite);
        let calls = Rc::new(RefCell::new(0));
        let counter = calls.clone();
        let handle = od
            .add_listener(0x1006, 0, move |_| *counter.borrow_mut() += 1)
            .unwrap();

        let removed = od.remove_entry(0x1006).unwrap();
        assert_eq!(removed.listener_count(), 0);
        assert!(od.get_entry(0x1006).is_none());

        // Re-inserting the detached entry does not resurrect the listener.
        od.insert(0x1006, removed);
        od.write(0x1006, 0, ObjectValue::Unsigned32(7)).unwrap();
        assert_eq!(*calls.borrow(), 0);
        assert!(!od.remove_listener(handle));
    }

    #[test]
    fn test_sub_index_zero_of_array_is_not_writable() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x2000,
            ObjectEntry::array("TestArray", vec![ObjectValue::Unsigned8(0)], AccessType::ReadWrite),
        );
        assert_eq!(
            od.write(0x2000, 0, ObjectValue::Unsigned8(5)),
            Err(CanOpenError::AccessDenied)
        );
    }

    #[test]
    fn test_push_sub_entry() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2000, ObjectEntry::array("TestArray", vec![], AccessType::ReadWrite));

        assert_eq!(od.push_sub_entry(0x2000, ObjectValue::Unsigned32(1)), Ok(1));
        assert_eq!(od.push_sub_entry(0x2000, ObjectValue::Unsigned32(2)), Ok(2));
        assert_eq!(
            od.push_sub_entry(0x2000, ObjectValue::Unsigned8(3)),
            Err(CanOpenError::TypeMismatch)
        );
        assert_eq!(od.read_u8(0x2000, 0), Some(2));
    }

    #[test]
    fn test_resize_array_preserves_prefix_and_drops_listeners() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x2000,
            ObjectEntry::array(
                "TestArray",
                vec![
                    ObjectValue::Unsigned32(10),
                    ObjectValue::Unsigned32(20),
                    ObjectValue::Unsigned32(30),
                ],
                AccessType::ReadWrite,
            ),
        );
        od.add_listener(0x2000, 3, |_| {}).unwrap();
        od.add_listener(0x2000, 1, |_| {}).unwrap();

        od.resize_array(0x2000, 1, ObjectValue::Unsigned32(0)).unwrap();
        assert_eq!(od.read_u32(0x2000, 1), Some(10));
        assert!(od.read(0x2000, 2).is_none());
        assert_eq!(od.get_entry(0x2000).unwrap().listener_count(), 1);

        od.resize_array(0x2000, 3, ObjectValue::Unsigned32(0)).unwrap();
        assert_eq!(od.read_u32(0x2000, 1), Some(10));
        assert_eq!(od.read_u32(0x2000, 3), Some(0));
        assert_eq!(od.sub_number(0x2000), Some(4));
    }

    #[test]
    fn test_array_growth_is_capped() {
        let mut od = ObjectDictionary::new();
        od.insert(0x2000, ObjectEntry::array("TestArray", vec![], AccessType::ReadWrite));
        for _ in 0..MAX_SUB_ENTRIES {
            od.push_sub_entry(0x2000, ObjectValue::Unsigned8(0)).unwrap();
        }
        assert_eq!(
            od.push_sub_entry(0x2000, ObjectValue::Unsigned8(0)),
            Err(CanOpenError::RangeError)
        );
        assert_eq!(od.read_u8(0x2000, 0), Some(254));
        assert_eq!(od.sub_number(0x2000), Some(255));
        assert_eq!(
            od.resize_array(0x2000, 255, ObjectValue::Unsigned8(0)),
            Err(CanOpenError::RangeError)
        );
    }

    #[test]
    fn test_resize_array_notifies_count_listeners() {
        let mut od = ObjectDictionary::new();
        od.insert(
            0x2000,
            ObjectEntry::array("TestArray", vec![ObjectValue::Unsigned32(1)], AccessType::ReadWrite),
        );
        let counts: Rc<RefCell<Vec<ObjectValue>>> = Rc::new(RefCell::new(Vec::new()));
        let seen = counts.clone();
        od.add_listener(0x2000, 0, move |v| seen.borrow_mut().push(v.clone()))
            .unwrap();

        od.resize_array(0x2000, 4, ObjectValue::Unsigned32(0)).unwrap();
        od.resize_array(0x2000, 4, ObjectValue::Unsigned32(0)).unwrap();
        od.resize_array(0x2000, 2, ObjectValue::Unsigned32(0)).unwrap();
        assert_eq!(
            *counts.borrow(),
            vec![ObjectValue::Unsigned8(4), ObjectValue::Unsigned8(2)]
        );
    }
}
