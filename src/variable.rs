//! Definition of the variable module
//!
//! A `Variable` is a named categorical column together with its state space:
//! the sorted set of distinct values the column takes in a reference dataset.
//! The sort order fixes the row/column indices of every table built over the
//! variable, so two components that index the "same" variable must build it
//! from the same reference dataset.

use table::Table;
use util::{LaplaceError, Result};

use bidir_map::BidirMap;
use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Variable {

    /// The name of the `Variable`
    name: String,

    /// The state space: sorted, deduplicated. Immutable once built.
    states: Vec<String>

}

impl Variable {

    /// Construct a `Variable` from an explicit set of states. The states are
    /// sorted and deduplicated; the supplied order does not matter.
    pub fn new(name: &str, states: &[&str]) -> Self {
        let mut states: Vec<String> = states.iter().map(|s| String::from(*s)).collect();
        states.sort();
        states.dedup();

        Variable { name: String::from(name), states }
    }


    /// Construct a `Variable` whose state space is the sorted set of distinct
    /// values observed in the named column of `data`.
    ///
    /// # Errors
    /// * `LaplaceError::MissingColumn` if `data` has no such column
    /// * `LaplaceError::NotEnoughData` if the column is empty
    pub fn from_column(data: &Table, name: &str) -> Result<Self> {
        let column = data.column(name)?;
        if column.is_empty() {
            return Err(LaplaceError::NotEnoughData);
        }

        let mut states: Vec<String> = column.to_vec();
        states.sort();
        states.dedup();

        Ok(Variable { name: String::from(name), states })
    }


    /// Get the name of the `Variable`
    pub fn name(&self) -> &str {
        &self.name
    }


    /// The states of the `Variable`, in index order
    pub fn states(&self) -> &[String] {
        &self.states
    }


    /// The number of states of the `Variable`
    pub fn cardinality(&self) -> usize {
        self.states.len()
    }


    /// The index of a state value in the sorted state space
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.states.binary_search_by(|s| s.as_str().cmp(value)).ok()
    }


    /// The state value at the given index
    pub fn state(&self, index: usize) -> Option<&str> {
        self.states.get(index).map(|s| s.as_str())
    }

}


/// The state-value <-> state-index bijection for a `Variable`. Indices are the
/// ranks assigned by sorting the state space.
pub fn state_mapping(var: &Variable) -> BidirMap<String, usize> {
    let mut map = BidirMap::new();
    for (i, state) in var.states().iter().enumerate() {
        map.insert(state.clone(), i);
    }

    map
}


/// The nested mapping from each named variable in `universe` to its state
/// bijection, with state spaces taken from `data`. Both the query memoizer and
/// the evaluation layer encode evidence through this map, so building it from
/// the full dataset keeps their indices consistent with the trained tables.
pub fn environment_map(
    data: &Table,
    universe: &[String]
) -> Result<IndexMap<String, BidirMap<String, usize>>> {
    let mut map = IndexMap::new();
    for name in universe {
        let var = Variable::from_column(data, name)?;
        map.insert(name.clone(), state_mapping(&var));
    }

    Ok(map)
}


/// A partial assignment of state indices to named variables. Iteration order
/// is the insertion order, so assignments iterate deterministically.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    values: IndexMap<String, usize>
}

impl Assignment {

    pub fn new() -> Self {
        Assignment { values: IndexMap::new() }
    }


    /// Assign a state index to a `Variable`
    pub fn set(&mut self, var: &Variable, index: usize) {
        self.values.insert(String::from(var.name()), index);
    }


    /// Assign a state index by variable name. No bounds check happens here;
    /// a consumer that indexes a table with the value must reject an
    /// out-of-range index itself.
    pub fn set_named(&mut self, name: &str, index: usize) {
        self.values.insert(String::from(name), index);
    }


    pub fn get(&self, var: &Variable) -> Option<usize> {
        self.get_named(var.name())
    }


    pub fn get_named(&self, name: &str) -> Option<usize> {
        self.values.get(name).cloned()
    }


    /// The assigned variable names, in insertion order
    pub fn names(&self) -> Vec<&str> {
        self.values.keys().map(|k| k.as_str()).collect()
    }


    pub fn len(&self) -> usize {
        self.values.len()
    }


    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

}


/// The number of joint states of an ordered set of `Variable`s. The empty set
/// has exactly one joint state.
pub fn joint_cardinality(vars: &[Variable]) -> usize {
    vars.iter().map(|v| v.cardinality()).product()
}


/// The row-major rank of a joint state: the last variable varies fastest.
/// This is the column order of every CPT built over `vars`.
pub fn joint_index(vars: &[Variable], indices: &[usize]) -> usize {
    debug_assert_eq!(vars.len(), indices.len());

    vars.iter()
        .zip(indices.iter())
        .fold(0, |acc, (v, &i)| acc * v.cardinality() + i)
}


/// Invert `joint_index`: recover per-variable state indices from a rank.
pub fn unravel_joint(vars: &[Variable], rank: usize) -> Vec<usize> {
    let mut indices = vec![0; vars.len()];
    let mut rest = rank;

    for (slot, v) in indices.iter_mut().zip(vars.iter()).rev() {
        let card = v.cardinality();
        *slot = rest % card;
        rest /= card;
    }

    indices
}


/// Iterator over every complete `Assignment` to `vars`, in row-major order
/// (last variable fastest). An empty scope yields a single empty assignment.
pub fn all_assignments<'a>(vars: &'a [Variable]) -> Assignments<'a> {
    Assignments { vars, next: 0, total: joint_cardinality(vars) }
}


pub struct Assignments<'a> {
    vars: &'a [Variable],
    next: usize,
    total: usize
}

impl<'a> Iterator for Assignments<'a> {

    type Item = Assignment;

    fn next(&mut self) -> Option<Assignment> {
        if self.next >= self.total {
            return None;
        }

        let indices = unravel_joint(self.vars, self.next);
        self.next += 1;

        let mut assn = Assignment::new();
        for (v, &i) in self.vars.iter().zip(indices.iter()) {
            assn.set(v, i);
        }

        Some(assn)
    }

}


// Unit tests
#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn sorted_state_space() {
        let v = Variable::new("Color", &["red", "blue", "green", "blue"]);
        assert_eq!(&["blue", "green", "red"], v.states());
        assert_eq!(3, v.cardinality());
        assert_eq!(Some(0), v.index_of("blue"));
        assert_eq!(Some(2), v.index_of("red"));
        assert_eq!(None, v.index_of("mauve"));
        assert_eq!(Some("green"), v.state(1));
    }

    #[test]
    fn from_column_sorts_by_value_not_frequency() {
        let t = Table::from_rows(
            &["X"],
            &[vec!["zebra"], vec!["zebra"], vec!["zebra"], vec!["ant"]]
        ).unwrap();

        let v = Variable::from_column(&t, "X").unwrap();
        assert_eq!(&["ant", "zebra"], v.states());
    }

    #[test]
    fn from_empty_column() {
        let t = Table::from_rows(&["X"], &[]).unwrap();
        match Variable::from_column(&t, "X") {
            Err(LaplaceError::NotEnoughData) => (),
            _ => panic!("wrong error type")
        };
    }

    #[test]
    fn state_mapping_bijection() {
        let v = Variable::new("X", &["b", "a", "c"]);
        let map = state_mapping(&v);

        assert_eq!(Some(&0), map.get_by_first(&String::from("a")));
        assert_eq!(Some(&2), map.get_by_first(&String::from("c")));
        assert_eq!(Some(&String::from("b")), map.get_by_second(&1));
    }

    #[test]
    fn environment_map_uses_full_table() {
        let t = Table::from_rows(
            &["X", "Y"],
            &[vec!["a", "0"], vec!["b", "1"], vec!["c", "0"]]
        ).unwrap();

        let env = environment_map(&t, &[String::from("X")]).unwrap();
        assert_eq!(1, env.len());
        assert_eq!(Some(&2), env["X"].get_by_first(&String::from("c")));
    }

    #[test]
    fn assignment() {
        let x = Variable::new("X", &["a", "b"]);
        let y = Variable::new("Y", &["0", "1", "2"]);

        let mut assn = Assignment::new();
        assert!(assn.is_empty());

        assn.set(&x, 1);
        assn.set(&y, 2);

        assert_eq!(Some(1), assn.get(&x));
        assert_eq!(Some(2), assn.get_named("Y"));
        assert_eq!(None, assn.get_named("Z"));
        assert_eq!(vec!["X", "Y"], assn.names());
    }

    #[test]
    fn joint_round_trip() {
        let vars = vec![
            Variable::new("A", &["0", "1", "2"]),
            Variable::new("B", &["0", "1"]),
            Variable::new("C", &["0", "1", "2", "3"])
        ];

        assert_eq!(24, joint_cardinality(&vars));

        for rank in 0..24 {
            let indices = unravel_joint(&vars, rank);
            assert_eq!(rank, joint_index(&vars, &indices));
        }

        // last variable varies fastest
        assert_eq!(vec![0, 0, 1], unravel_joint(&vars, 1));
        assert_eq!(vec![0, 1, 0], unravel_joint(&vars, 4));
        assert_eq!(vec![1, 0, 0], unravel_joint(&vars, 8));
    }

    #[test]
    fn empty_joint() {
        assert_eq!(1, joint_cardinality(&[]));
        assert_eq!(1, all_assignments(&[]).count());
        assert!(all_assignments(&[]).next().unwrap().is_empty());
    }

    #[test]
    fn all_assignments_order() {
        let vars = vec![
            Variable::new("A", &["0", "1"]),
            Variable::new("B", &["0", "1", "2"])
        ];

        let a = &vars[0];
        let b = &vars[1];

        let seen: Vec<(usize, usize)> = all_assignments(&vars)
            .map(|assn| (assn.get(a).unwrap(), assn.get(b).unwrap()))
            .collect();

        let expected: Vec<(usize, usize)> = iproduct!(0..2, 0..3).collect();
        assert_eq!(expected, seen);
    }

}
