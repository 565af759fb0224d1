//! Utilitarian-optimal allocation as a 0/1 integer program.
//!
//! Every agent's compiled valuation contributes one block to a
//! block-diagonal constraint matrix over the concatenated per-agent
//! indicator vectors; maximizing the number of assigned copies under those
//! constraints yields the utilitarian-welfare optimum, which tests use as an
//! oracle for the allocator. Pool capacity is deliberately absent: the
//! bridge is meant for small instances where supply covers demand.
//!
//! The search is a depth-first branch and bound. Builder-produced matrices
//! are non-negative, so a partial assignment whose row sums already exceed
//! the right-hand side can be pruned, and `taken + remaining ≤ best` bounds
//! the rest.

use ndarray::{Array1, Array2};
use thiserror::Error;

use log::debug;

use crate::allocation::Allocation;
use crate::constraints::ConstraintError;
use crate::valuation::ConstraintValuation;

/// Errors surfaced by the allocation program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptimizationError {
    #[error("no optimal solution found")]
    NoOptimalSolution,

    #[error("allocation has {columns} agent columns but the program spans {agents} agents")]
    AgentColumnsMismatch { agents: usize, columns: usize },

    #[error("agent {agent} valuation spans {extent} items, schedule has {expected}")]
    BlockExtentMismatch {
        agent: usize,
        extent: usize,
        expected: usize,
    },

    #[error(transparent)]
    Constraint(#[from] ConstraintError),
}

/// Block-diagonal 0/1 program over all agents' compiled constraints.
#[derive(Debug, Clone)]
pub struct AllocationProgram {
    a: Array2<i64>,
    b: Array1<i64>,
    n_agents: usize,
    n_items: usize,
    nonnegative: bool,
}

impl AllocationProgram {
    /// Compiles each valuation to a single stacked constraint and assembles
    /// the block-diagonal matrix.
    pub fn compile(
        valuations: &[ConstraintValuation],
        n_items: usize,
    ) -> Result<Self, OptimizationError> {
        let mut blocks: Vec<crate::constraints::LinearConstraint> = Vec::new();
        for (agent, valuation) in valuations.iter().enumerate() {
            let compiled = valuation.compile()?;
            match compiled.constraints().first() {
                Some(constraint) => {
                    if constraint.extent() != n_items {
                        return Err(OptimizationError::BlockExtentMismatch {
                            agent,
                            extent: constraint.extent(),
                            expected: n_items,
                        });
                    }
                    blocks.push(constraint.clone());
                }
                None => blocks.push(crate::constraints::LinearConstraint::new(
                    Array2::zeros((0, n_items)),
                    Array1::zeros(0),
                )?),
            }
        }

        let total_rows: usize = blocks.iter().map(|c| c.rows()).sum();
        let n_agents = valuations.len();
        let mut a = Array2::zeros((total_rows, n_agents * n_items));
        let mut b = Array1::zeros(total_rows);
        let mut row_offset = 0;
        for (agent, block) in blocks.iter().enumerate() {
            let col_offset = agent * n_items;
            for row in 0..block.rows() {
                for col in 0..n_items {
                    a[[row_offset + row, col_offset + col]] = block.matrix()[[row, col]];
                }
                b[row_offset + row] = block.rhs()[row];
            }
            row_offset += block.rows();
        }
        let nonnegative = a.iter().all(|&c| c >= 0);
        Ok(Self {
            a,
            b,
            n_agents,
            n_items,
            nonnegative,
        })
    }

    pub fn n_agents(&self) -> usize {
        self.n_agents
    }

    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// True if `A·x ≤ b` holds for the stacked assignment vector.
    pub fn satisfied_by(&self, x: &[i64]) -> bool {
        if x.len() != self.a.ncols() {
            return false;
        }
        let x = Array1::from(x.to_vec());
        self.a
            .dot(&x)
            .iter()
            .zip(self.b.iter())
            .all(|(lhs, rhs)| lhs <= rhs)
    }

    /// Maximizes the number of assigned copies over `x ∈ {0,1}^(agents·items)`.
    ///
    /// Depth-first branch and bound, assigning each variable 1 before 0 so
    /// the incumbent fills fast. Returns the stacked assignment vector.
    pub fn solve_usw(&self) -> Result<Vec<i64>, OptimizationError> {
        let variables = self.a.ncols();
        let mut row_sums = vec![0_i64; self.a.nrows()];
        let mut current = vec![0_i64; variables];
        let mut best: Option<(u64, Vec<i64>)> = None;
        let mut explored = 0_u64;
        self.branch(
            0,
            0,
            &mut row_sums,
            &mut current,
            &mut best,
            &mut explored,
        );
        debug!("branch and bound explored {explored} nodes");
        best.map(|(_, x)| x).ok_or(OptimizationError::NoOptimalSolution)
    }

    fn branch(
        &self,
        variable: usize,
        taken: u64,
        row_sums: &mut Vec<i64>,
        current: &mut Vec<i64>,
        best: &mut Option<(u64, Vec<i64>)>,
        explored: &mut u64,
    ) {
        *explored += 1;
        // With non-negative coefficients a violated row can never recover.
        if self.nonnegative
            && row_sums.iter().zip(self.b.iter()).any(|(sum, rhs)| sum > rhs)
        {
            return;
        }
        if variable == self.a.ncols() {
            let feasible = row_sums
                .iter()
                .zip(self.b.iter())
                .all(|(sum, rhs)| sum <= rhs);
            if feasible && best.as_ref().map_or(true, |(score, _)| taken > *score) {
                *best = Some((taken, current.clone()));
            }
            return;
        }
        // Optimistic bound: every remaining variable set to 1.
        let remaining = (self.a.ncols() - variable) as u64;
        if let Some((score, _)) = best {
            if taken + remaining <= *score {
                return;
            }
        }

        current[variable] = 1;
        for row in 0..self.a.nrows() {
            row_sums[row] += self.a[[row, variable]];
        }
        self.branch(variable + 1, taken + 1, row_sums, current, best, explored);
        for row in 0..self.a.nrows() {
            row_sums[row] -= self.a[[row, variable]];
        }
        current[variable] = 0;

        self.branch(variable + 1, taken, row_sums, current, best, explored);
    }

    /// Stacks an allocation's agent columns into the program's variable
    /// order, for feasibility cross-checks.
    pub fn convert_allocation(
        &self,
        allocation: &Allocation,
    ) -> Result<Vec<i64>, OptimizationError> {
        if allocation.n_agents() < self.n_agents {
            return Err(OptimizationError::AgentColumnsMismatch {
                agents: self.n_agents,
                columns: allocation.n_agents(),
            });
        }
        let mut stacked = Vec::with_capacity(self.n_agents * self.n_items);
        for agent in 0..self.n_agents {
            for item in 0..self.n_items {
                stacked.push(allocation.matrix()[[item, agent]]);
            }
        }
        Ok(stacked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::tests::{build_schedule, student_for};
    use crate::allocation::general_yankee_swap;
    use crate::metrics::utilitarian_welfare;
    use ndarray::array;

    #[test]
    fn block_diagonal_assembly() {
        let c = crate::constraints::LinearConstraint::new(array![[1, 1]], array![1]).unwrap();
        let valuations = vec![
            ConstraintValuation::new(vec![c.clone()]),
            ConstraintValuation::new(vec![c]),
        ];
        let program = AllocationProgram::compile(&valuations, 2).unwrap();
        assert_eq!(program.a.shape(), &[2, 4]);
        assert_eq!(program.a.row(0).to_vec(), vec![1, 1, 0, 0]);
        assert_eq!(program.a.row(1).to_vec(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn solver_fills_every_feasible_seat() {
        let c = crate::constraints::LinearConstraint::new(array![[1, 1]], array![1]).unwrap();
        let valuations = vec![
            ConstraintValuation::new(vec![c.clone()]),
            ConstraintValuation::new(vec![c]),
        ];
        let program = AllocationProgram::compile(&valuations, 2).unwrap();
        let x = program.solve_usw().unwrap();
        assert_eq!(x.iter().sum::<i64>(), 2); // one item per agent
        assert!(program.satisfied_by(&x));
    }

    #[test]
    fn infeasible_rhs_surfaces_no_optimal_solution() {
        // x0 >= 0 can never satisfy x0 <= -1.
        let c =
            crate::constraints::LinearConstraint::new(array![[1, 0]], array![-1]).unwrap();
        let program =
            AllocationProgram::compile(&[ConstraintValuation::new(vec![c])], 2).unwrap();
        assert!(matches!(
            program.solve_usw(),
            Err(OptimizationError::NoOptimalSolution)
        ));
    }

    #[test]
    fn gys_matches_the_ilp_optimum_on_small_instances() {
        // Ample capacity, so the capacity-blind program is a valid oracle.
        let (items, course, slot, weekday) = build_schedule(&[
            ("250", "09:00-09:50", 3),
            ("301", "10:00-10:50", 3),
            ("611", "11:00-11:50", 3),
        ]);
        let students = vec![
            student_for(&items, &[0, 1], 2, &course, &slot, &weekday),
            student_for(&items, &[1, 2], 2, &course, &slot, &weekday),
            student_for(&items, &[0, 2], 1, &course, &slot, &weekday),
        ];

        let outcome = general_yankee_swap(&students, &items);
        let gys_usw = utilitarian_welfare(&outcome.allocation, &students);

        let valuations: Vec<ConstraintValuation> = students
            .iter()
            .map(|s| s.valuation().inner().clone())
            .collect();
        let program = AllocationProgram::compile(&valuations, items.len()).unwrap();
        let x = program.solve_usw().unwrap();
        let ilp_usw = x.iter().sum::<i64>() as f64 / students.len() as f64;

        assert_eq!(gys_usw, ilp_usw);
        // The allocator's own output satisfies the program's constraints.
        let stacked = program.convert_allocation(&outcome.allocation).unwrap();
        assert!(program.satisfied_by(&stacked));
    }

    #[test]
    fn conversion_needs_enough_agent_columns() {
        let c = crate::constraints::LinearConstraint::new(array![[1]], array![1]).unwrap();
        let valuations = vec![
            ConstraintValuation::new(vec![c.clone()]),
            ConstraintValuation::new(vec![c]),
        ];
        let program = AllocationProgram::compile(&valuations, 1).unwrap();

        let items = crate::allocation::tests::plain_schedule(&[1]);
        let narrow = Allocation::new(&items, 1);
        assert!(matches!(
            program.convert_allocation(&narrow),
            Err(OptimizationError::AgentColumnsMismatch { .. })
        ));
    }
}
