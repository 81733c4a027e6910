//! The multiple-values register.
//!
//! A Lisp call returns exactly one value through the ordinary call path, but forms such
//! as `(values 1 2 3)` logically produce several. The full sequence is parked in a
//! [`ValuesRegister`] while the single "primary" value keeps flowing through normal
//! evaluation, so values-producing expressions compose transparently into arithmetic,
//! conditionals and argument positions.
//!
//! The register has no history: each producer overwrites it. Consumers that need an
//! outer result to survive a nested evaluation must bracket that evaluation with
//! [`ValuesRegister::snapshot`] and [`ValuesRegister::restore`].
//!
//! ## Protocol
//!
//! ```text
//! evaluate producer -> (snapshot) -> intervening evaluation -> (restore) -> consume
//! ```
//!
//! Reading the register when the intended producer did not run last (for instance a
//! [`ValuesRegister::multiple_value_call`] whose final argument was an ordinary
//! single-value expression) yields whatever some earlier producer left behind. That is
//! a caller error which the register cannot detect and does not try to repair; the
//! evaluator avoids it by calling [`ValuesRegister::produce_one`] for every form that
//! does not produce values itself.
//!
//! The register is plain data owned by its interpreter. Hosts running several
//! evaluators, or several threads, give each one its own register.

/// Value types that have a distinguished encoding for "zero values".
///
/// [`ValuesRegister::produce_many`] returns this sentinel as the primary value of an
/// empty value sequence.
pub trait EmptySentinel {
    fn empty_sentinel() -> Self;
}

/// Holds the value sequence produced by the most recently completed values-producing
/// evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValuesRegister<V> {
    current: Vec<V>,
}

impl<V> Default for ValuesRegister<V> {
    fn default() -> Self {
        ValuesRegister {
            current: Vec::new(),
        }
    }
}

impl<V> ValuesRegister<V> {
    /// Create a register holding the empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the register to `[value]` and return `value`.
    pub fn produce_one(&mut self, value: V) -> V
    where
        V: Clone,
    {
        self.current.clear();
        self.current.push(value.clone());
        value
    }

    /// Set the register to `values` verbatim and return the primary value: the first
    /// element, or the empty sentinel when `values` is empty.
    pub fn produce_many(&mut self, values: Vec<V>) -> V
    where
        V: Clone + EmptySentinel,
    {
        self.current = values;
        self.primary()
    }

    /// Copy out the current contents without modifying the register.
    pub fn snapshot(&self) -> Vec<V>
    where
        V: Clone,
    {
        self.current.clone()
    }

    /// Overwrite the register with a previously saved sequence.
    pub fn restore(&mut self, saved: Vec<V>) {
        self.current = saved;
    }

    /// Call `f` with `leading_args` followed by the current register contents.
    ///
    /// The caller must have evaluated every argument but the last to its primary value
    /// (`leading_args`), and then evaluated the last argument so that it refreshed the
    /// register. `f` receives the register back because the callee may itself produce
    /// values; its result is returned unchanged.
    pub fn multiple_value_call<R, F>(&mut self, leading_args: Vec<V>, f: F) -> R
    where
        V: Clone,
        F: FnOnce(Vec<V>, &mut Self) -> R,
    {
        let mut args = leading_args;
        args.extend(self.current.iter().cloned());
        f(args, self)
    }

    /// Borrow the current contents.
    pub fn as_slice(&self) -> &[V] {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// The primary value of the current contents.
    pub fn primary(&self) -> V
    where
        V: Clone + EmptySentinel,
    {
        self.current
            .first()
            .cloned()
            .unwrap_or_else(V::empty_sentinel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal opaque payload: `None` plays the role of nil.
    #[derive(Debug, Clone, PartialEq)]
    struct Slot(Option<i32>);

    impl EmptySentinel for Slot {
        fn empty_sentinel() -> Self {
            Slot(None)
        }
    }

    fn slots(ns: &[i32]) -> Vec<Slot> {
        ns.iter().map(|n| Slot(Some(*n))).collect()
    }

    #[test]
    fn test_fresh_register_is_empty() {
        let register: ValuesRegister<Slot> = ValuesRegister::new();
        assert!(register.is_empty());
        assert_eq!(register.snapshot(), vec![]);
        assert_eq!(register.primary(), Slot(None));
    }

    #[test]
    fn test_produce_one() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[9, 9, 9]));

        assert_eq!(register.produce_one(Slot(Some(4))), Slot(Some(4)));
        assert_eq!(register.snapshot(), slots(&[4]));
    }

    #[test]
    fn test_produce_many_data_driven() {
        // (input, expected primary)
        let test_cases: Vec<(Vec<Slot>, Slot)> = vec![
            (vec![], Slot(None)),
            (slots(&[1]), Slot(Some(1))),
            (slots(&[1, 2, 3]), Slot(Some(1))),
            (slots(&[7, 7, 7, 7]), Slot(Some(7))), // duplicates preserved
            (vec![Slot(None), Slot(Some(2))], Slot(None)), // nil as a real first value
        ];

        for (i, (input, expected_primary)) in test_cases.into_iter().enumerate() {
            let mut register = ValuesRegister::new();
            let primary = register.produce_many(input.clone());
            assert_eq!(primary, expected_primary, "case #{}: primary", i + 1);
            assert_eq!(register.snapshot(), input, "case #{}: contents", i + 1);
            assert_eq!(register.len(), input.len(), "case #{}: length", i + 1);
        }
    }

    #[test]
    fn test_snapshot_is_non_destructive() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[3, 1, 2]));

        let first = register.snapshot();
        let second = register.snapshot();
        assert_eq!(first, second);
        assert_eq!(register.as_slice(), first.as_slice());
    }

    #[test]
    fn test_restore_survives_nested_producer() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[1, 2]));

        let saved = register.snapshot();
        register.produce_many(slots(&[10, 20, 30]));
        register.produce_one(Slot(Some(99)));
        register.restore(saved.clone());

        assert_eq!(register.snapshot(), saved);
        assert_eq!(register.snapshot(), slots(&[1, 2]));
    }

    #[test]
    fn test_restore_overwrites_unconditionally() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[1, 2, 3]));
        register.restore(vec![]);
        assert!(register.is_empty());
    }

    #[test]
    fn test_multiple_value_call_splices_register_after_leading_args() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[7, 8, 9]));

        let received = register.multiple_value_call(slots(&[1, 2]), |args, _| args);
        assert_eq!(received, slots(&[1, 2, 7, 8, 9]));
    }

    #[test]
    fn test_multiple_value_call_returns_callee_result() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[1, 2, 3]));

        let sum = register.multiple_value_call(slots(&[10]), |args, _| {
            args.iter().filter_map(|s| s.0).sum::<i32>()
        });
        assert_eq!(sum, 16);
    }

    #[test]
    fn test_multiple_value_call_callee_may_produce() {
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[5, 6]));

        let primary = register.multiple_value_call(vec![], |args, register| {
            register.produce_many(args.into_iter().rev().collect())
        });
        assert_eq!(primary, Slot(Some(6)));
        assert_eq!(register.snapshot(), slots(&[6, 5]));
    }

    #[test]
    fn test_stale_register_is_consumed_verbatim() {
        // Consuming without a fresh producer reads whatever was produced last.
        let mut register = ValuesRegister::new();
        register.produce_many(slots(&[4, 5]));

        let received = register.multiple_value_call(slots(&[1]), |args, _| args);
        assert_eq!(received, slots(&[1, 4, 5]));
    }
}
