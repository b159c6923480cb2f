//! Select pipeline: sources → joins → where → groups/having → projection →
//! distinct → order → window.

use crate::{
    expr::OrderDirection,
    memory::{
        MemoryError,
        eval::{Evaluator, Frame, Source, Tuple},
    },
    query::{JoinKind, Select},
    value::{Value, group_eq, sort_cmp},
};
use std::cmp::Ordering;

// Projected values plus the order-by keys computed alongside them.
struct Output {
    values: Vec<Value>,
    keys: Vec<Value>,
}

impl<'d> Evaluator<'d> {
    pub(super) fn run_select(
        &self,
        select: &'d Select,
        outer: Option<&Frame<'_, 'd>>,
    ) -> Result<Vec<Vec<Value>>, MemoryError> {
        let sources = select
            .sources()
            .map(|table| {
                Ok(Source {
                    binding: table.binding(),
                    table: self.table(table.name())?,
                })
            })
            .collect::<Result<Vec<_>, MemoryError>>()?;

        let tuples = self.join(select, &sources, outer)?;
        let tuples = self.filter(select, &sources, tuples, outer)?;

        let mut out = if select.is_grouped() {
            self.grouped(select, &sources, tuples, outer)?
        } else {
            tuples
                .iter()
                .map(|tuple| {
                    let frame = Frame {
                        sources: &sources,
                        tuple,
                        group: None,
                        outer,
                    };
                    self.project(select, &frame)
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        if select.is_distinct() {
            let mut unique: Vec<Output> = Vec::with_capacity(out.len());
            for row in out {
                let seen = unique.iter().any(|kept| {
                    kept.values
                        .iter()
                        .zip(&row.values)
                        .all(|(a, b)| group_eq(a, b))
                });
                if !seen {
                    unique.push(row);
                }
            }
            out = unique;
        }

        if !select.order_by().is_empty() {
            out.sort_by(|a, b| order(select, &a.keys, &b.keys));
        }

        let offset = select
            .offset()
            .map_or(0, |n| usize::try_from(n).unwrap_or(usize::MAX));
        let limit = select
            .limit()
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX));

        Ok(out
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|row| row.values)
            .collect())
    }

    // Cross product of `from` sources, then each join in order.
    fn join(
        &self,
        select: &'d Select,
        sources: &[Source<'d>],
        outer: Option<&Frame<'_, 'd>>,
    ) -> Result<Vec<Tuple<'d>>, MemoryError> {
        let mut tuples: Vec<Tuple<'d>> = vec![Vec::new()];

        for source in &sources[..select.from().len()] {
            tuples = tuples
                .into_iter()
                .flat_map(|tuple| {
                    source.table.rows.iter().map(move |row| {
                        let mut next = tuple.clone();
                        next.push(Some(row.as_slice()));
                        next
                    })
                })
                .collect();
        }

        for (offset, join) in select.joins().iter().enumerate() {
            let position = select.from().len() + offset;
            let source = &sources[position];
            let mut joined = Vec::new();

            for tuple in tuples {
                let mut matched = false;
                for row in &source.table.rows {
                    let mut candidate = tuple.clone();
                    candidate.push(Some(row.as_slice()));

                    let keep = {
                        let frame = Frame {
                            sources: &sources[..=position],
                            tuple: &candidate,
                            group: None,
                            outer,
                        };
                        self.test(join.condition().expr(), &frame)?
                    };
                    if keep {
                        joined.push(candidate);
                        matched = true;
                    }
                }

                if !matched && join.kind() == JoinKind::Left {
                    let mut extended = tuple;
                    extended.push(None);
                    joined.push(extended);
                }
            }

            tuples = joined;
        }

        Ok(tuples)
    }

    fn filter(
        &self,
        select: &'d Select,
        sources: &[Source<'d>],
        tuples: Vec<Tuple<'d>>,
        outer: Option<&Frame<'_, 'd>>,
    ) -> Result<Vec<Tuple<'d>>, MemoryError> {
        let Some(filter) = select.filter() else {
            return Ok(tuples);
        };

        let mut kept = Vec::with_capacity(tuples.len());
        for tuple in tuples {
            let keep = {
                let frame = Frame {
                    sources,
                    tuple: &tuple,
                    group: None,
                    outer,
                };
                self.test(filter.expr(), &frame)?
            };
            if keep {
                kept.push(tuple);
            }
        }

        Ok(kept)
    }

    // Groups in first-appearance order. Without group-by expressions the
    // whole input is one group, even when empty.
    fn grouped(
        &self,
        select: &'d Select,
        sources: &[Source<'d>],
        tuples: Vec<Tuple<'d>>,
        outer: Option<&Frame<'_, 'd>>,
    ) -> Result<Vec<Output>, MemoryError> {
        let groups: Vec<Vec<Tuple<'d>>> = if select.group_by().is_empty() {
            vec![tuples]
        } else {
            let mut groups: Vec<(Vec<Value>, Vec<Tuple<'d>>)> = Vec::new();
            for tuple in tuples {
                let key = {
                    let frame = Frame {
                        sources,
                        tuple: &tuple,
                        group: None,
                        outer,
                    };
                    select
                        .group_by()
                        .iter()
                        .map(|expr| self.eval(expr, &frame))
                        .collect::<Result<Vec<_>, _>>()?
                };

                let existing = groups.iter_mut().find(|(k, _)| {
                    k.iter().zip(&key).all(|(a, b)| group_eq(a, b))
                });
                match existing {
                    Some((_, members)) => members.push(tuple),
                    None => groups.push((key, vec![tuple])),
                }
            }
            groups.into_iter().map(|(_, members)| members).collect()
        };

        let empty: Tuple<'d> = vec![None; sources.len()];
        let mut out = Vec::with_capacity(groups.len());
        for group in &groups {
            let frame = Frame {
                sources,
                tuple: group.first().unwrap_or(&empty),
                group: Some(group.as_slice()),
                outer,
            };

            if let Some(having) = select.having()
                && !self.test(having.expr(), &frame)?
            {
                continue;
            }

            out.push(self.project(select, &frame)?);
        }

        Ok(out)
    }

    fn project(&self, select: &'d Select, frame: &Frame<'_, 'd>) -> Result<Output, MemoryError> {
        let values = select
            .projections()
            .iter()
            .map(|p| self.eval(p.expr(), frame))
            .collect::<Result<Vec<_>, _>>()?;
        let keys = select
            .order_by()
            .iter()
            .map(|term| self.eval(term.expr(), frame))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Output { values, keys })
    }
}

// Multi-key, left to right. Descending flips value order but not the
// explicit null placement.
fn order(select: &Select, a: &[Value], b: &[Value]) -> Ordering {
    for (term, (a, b)) in select.order_by().iter().zip(a.iter().zip(b)) {
        let ordering = if a.is_null() || b.is_null() {
            sort_cmp(a, b, term.nulls_sort_first())
        } else {
            let ordering = sort_cmp(a, b, true);
            match term.direction() {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            }
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}
