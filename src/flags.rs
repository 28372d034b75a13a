use bitflags::bitflags;

bitflags! {
    /// Controls that shape a single [`crate::eval`] call.
    ///
    /// These are the only recognized options; any combination is legal, though some combinations
    /// are redundant (e.g. `VERBOSE` without `WARN` still emits notes, since `VERBOSE` implies
    /// `WARN` per [`Flags::normalize`]).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u8 {
        /// Permit interpretation of nested function calls encountered in VIR.
        const FCALL = 1 << 0;
        /// The caller is the top-level folder pass: reject scalar sub-call arguments that were
        /// not already folded, since they are known-unfoldable.
        const FOLDING = 1 << 1;
        /// Bounds-check violations are reported as user-visible errors rather than silent
        /// failures.
        const BOUNDS = 1 << 2;
        /// `report`/`assert` statements may execute and emit their message.
        const REPORT = 1 << 3;
        /// Emit a warning explaining why folding gave up.
        const WARN = 1 << 4;
        /// Emit a note tracing each successful fold.
        const VERBOSE = 1 << 5;
    }
}

impl Flags {
    /// Applies the implications documented on the individual flags: `VERBOSE` implies `WARN` and
    /// `BOUNDS`.
    pub fn normalize(self) -> Self {
        if self.contains(Flags::VERBOSE) {
            self | Flags::WARN | Flags::BOUNDS
        } else {
            self
        }
    }
}
