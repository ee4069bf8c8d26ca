//! Workload loading
//!
//! Text format: student count `N`, machine count `M`, then `N` records of
//! `arrival wash_time patience`, all whitespace separated. Students are
//! numbered from 1 in input order.

use crate::client::Student;
use crate::error::{Error, Result};
use std::str::FromStr;

/// A validated set of students and machines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workload {
    machines: usize,
    students: Vec<Student>,
}

impl Workload {
    pub fn new(machines: usize, students: Vec<Student>) -> Result<Self> {
        if students.is_empty() {
            return Err(Error::NoStudents);
        }
        if machines == 0 {
            return Err(Error::NoMachines);
        }
        Ok(Workload { machines, students })
    }

    /// Build from `(arrival, wash_time, patience)` triples, numbering from 1
    pub fn from_triples(machines: usize, triples: &[(usize, usize, usize)]) -> Result<Self> {
        let students = triples
            .iter()
            .enumerate()
            .map(|(i, &(arrival, wash_time, patience))| {
                Student::new(i + 1, arrival, wash_time, patience)
            })
            .collect();
        Self::new(machines, students)
    }

    pub fn machines(&self) -> usize {
        self.machines
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Students ordered by arrival, input order among equal arrivals
    pub fn by_arrival(&self) -> Vec<Student> {
        let mut students = self.students.clone();
        students.sort_by_key(|s| (s.arrival, s.index));
        students
    }
}

struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl Tokens<'_> {
    fn next_count(&mut self, field: &str) -> Result<usize> {
        let token = self.inner.next().ok_or_else(|| Error::MissingValue {
            expected: field.to_string(),
        })?;
        let value: i64 = token.parse().map_err(|_| Error::InvalidNumber {
            field: field.to_string(),
            token: token.to_string(),
        })?;
        usize::try_from(value).map_err(|_| Error::Negative {
            field: field.to_string(),
            value,
        })
    }
}

impl FromStr for Workload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut tokens = Tokens {
            inner: s.split_whitespace(),
        };
        let count = tokens.next_count("student count")?;
        let machines = tokens.next_count("machine count")?;
        if count == 0 {
            return Err(Error::NoStudents);
        }
        if machines == 0 {
            return Err(Error::NoMachines);
        }

        // the declared count is untrusted until that many records are read
        let mut students = Vec::with_capacity(count.min(1024));
        for index in 1..=count {
            let arrival = tokens.next_count(&format!("arrival time of student {}", index))?;
            let wash_time = tokens.next_count(&format!("washing time of student {}", index))?;
            let patience = tokens.next_count(&format!("patience of student {}", index))?;
            students.push(Student::new(index, arrival, wash_time, patience));
        }

        let trailing = tokens.inner.count();
        if trailing > 0 {
            log::warn!("ignoring {} trailing input tokens", trailing);
        }
        Workload::new(machines, students)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counts_and_records() {
        let workload: Workload = "3 2\n0 5 1\n2 3 0\n2 1 4\n".parse().unwrap();

        assert_eq!(workload.machines(), 2);
        assert_eq!(workload.len(), 3);
        assert_eq!(workload.students()[1], Student::new(2, 2, 3, 0));
    }

    #[test]
    fn layout_is_free_form() {
        let workload: Workload = "1   1 0\t2\n\n 0".parse().unwrap();
        assert_eq!(workload.students(), &[Student::new(1, 0, 2, 0)]);
    }

    #[test]
    fn truncated_input_names_missing_value() {
        let err = "2 1\n0 1 1\n3 4".parse::<Workload>().unwrap_err();
        assert!(
            matches!(err, Error::MissingValue { ref expected } if expected == "patience of student 2")
        );
    }

    #[test]
    fn rejects_negative_fields() {
        let err = "1 1\n0 -2 1".parse::<Workload>().unwrap_err();
        assert!(matches!(err, Error::Negative { value: -2, .. }));
    }

    #[test]
    fn rejects_non_numbers() {
        let err = "1 one\n0 1 1".parse::<Workload>().unwrap_err();
        assert!(matches!(err, Error::InvalidNumber { ref token, .. } if token == "one"));
    }

    #[test]
    fn rejects_empty_runs() {
        assert!(matches!("0 3".parse::<Workload>(), Err(Error::NoStudents)));
        assert!(matches!("1 0\n0 1 1".parse::<Workload>(), Err(Error::NoMachines)));
        assert!(matches!("".parse::<Workload>(), Err(Error::MissingValue { .. })));
    }

    #[test]
    fn huge_declared_count_fails_on_missing_records() {
        let err = "9223372036854775807 1\n0 1 0".parse::<Workload>().unwrap_err();
        assert!(
            matches!(err, Error::MissingValue { ref expected } if expected == "arrival time of student 2")
        );
    }

    #[test]
    fn arrival_order_is_stable() {
        let workload = Workload::from_triples(1, &[(5, 1, 1), (0, 1, 1), (5, 1, 1)]).unwrap();
        let order: Vec<usize> = workload.by_arrival().iter().map(|s| s.index).collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
