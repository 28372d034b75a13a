use crate::value::{Ptr, Value};

/// Default capacity of a single evaluation's arena, in value slots.
///
/// Measured in value slots rather than bytes, so that boundary cases ("a 4096-slot allocation
/// succeeds, 4097 fails") translate directly into `Heap::alloc` calls without dragging
/// `size_of::<Value>()` into the public contract. See `DESIGN.md` for the reasoning.
pub const DEFAULT_HEAP_CAP: usize = 4096;

// HEAP
// ================================================================================================

/// A bump-allocated arena with a fixed capacity and no free operation.
///
/// Allocation never moves existing slots (`Vec::push` only ever appends), so pointers handed out
/// by [`Heap::alloc`] stay valid for the arena's entire lifetime.
#[derive(Debug, Default)]
pub struct Heap {
    slots: Vec<Value>,
    cap: usize,
}

impl Heap {
    /// Creates an empty arena with the given capacity. Nothing is actually allocated until the
    /// first [`Heap::alloc`] call.
    pub fn new(cap: usize) -> Self {
        Heap { slots: Vec::new(), cap }
    }

    /// Current allocation watermark, in slots.
    pub fn watermark(&self) -> usize {
        self.slots.len()
    }

    /// Total capacity of this arena, in slots.
    pub fn capacity(&self) -> usize {
        self.cap
    }

    /// Allocates `count` slots, initialized to [`Value::Invalid`], returning a pointer to the
    /// first one. Returns `None` on overflow without allocating anything.
    pub fn alloc(&mut self, count: usize) -> Option<Ptr> {
        if self.slots.len() + count > self.cap {
            return None;
        }
        let start = self.slots.len();
        self.slots.resize(start + count, Value::Invalid);
        Some(Ptr(start))
    }

    /// Truncates the arena back to an earlier watermark. Restoring a caller's heap state after a
    /// callee's allocations are no longer reachable is not something normal evaluation does (the
    /// heap is shared across a whole call chain) but is handy for tests that want to probe the
    /// allocator in isolation.
    #[cfg(test)]
    pub fn truncate(&mut self, watermark: usize) {
        self.slots.truncate(watermark);
    }

    pub fn get(&self, ptr: Ptr) -> Option<&Value> {
        self.slots.get(ptr.0)
    }

    pub fn get_mut(&mut self, ptr: Ptr) -> Option<&mut Value> {
        self.slots.get_mut(ptr.0)
    }

    pub fn slice(&self, ptr: Ptr, len: usize) -> Option<&[Value]> {
        self.slots.get(ptr.0..ptr.0 + len)
    }

    /// Copies `count` values from `src` to `dst`, as the `copy` opcode does. Ranges may not
    /// overlap in any VIR this interpreter is asked to run, so a straightforward two-index copy
    /// (rather than `copy_within`) keeps the borrow checker happy without `unsafe`.
    pub fn copy(&mut self, dst: Ptr, src: Ptr, count: usize) {
        for i in 0..count {
            let value = self.slots[src.0 + i].clone();
            self.slots[dst.0 + i] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_advances_watermark() {
        let mut heap = Heap::new(16);
        let p = heap.alloc(4).unwrap();
        assert_eq!(p, Ptr(0));
        assert_eq!(heap.watermark(), 4);
        let q = heap.alloc(4).unwrap();
        assert_eq!(q, Ptr(4));
    }

    #[test]
    fn alloc_at_capacity_succeeds() {
        let mut heap = Heap::new(4096);
        assert!(heap.alloc(4096).is_some());
    }

    #[test]
    fn alloc_over_capacity_fails() {
        let mut heap = Heap::new(4096);
        assert!(heap.alloc(4097).is_none());
    }

    #[test]
    fn cumulative_overflow_fails_without_partial_allocation() {
        let mut heap = Heap::new(10);
        assert!(heap.alloc(6).is_some());
        assert!(heap.alloc(5).is_none());
        assert_eq!(heap.watermark(), 6);
    }

    #[test]
    fn pointers_stay_valid_across_further_allocations() {
        let mut heap = Heap::new(64);
        let p = heap.alloc(1).unwrap();
        *heap.get_mut(p).unwrap() = Value::Integer(42);
        heap.alloc(8).unwrap();
        assert_eq!(heap.get(p), Some(&Value::Integer(42)));
    }
}
