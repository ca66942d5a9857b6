//! Parent resolution and assertion hoisting over the flat component list.
//!
//! Components are addressed by their index in declaration order. Neither
//! pass mutates a component; they only record relationships.
use loadplan_types::{Component, ComponentKind, Warning};
use std::collections::HashMap;

/// The outcome of parent resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved parent of each component; `None` for the root and dropped components.
    pub parents: Vec<Option<usize>>,
    /// Whether each component survives into the plan.
    pub alive: Vec<bool>,
}

impl Resolution {
    /// Surviving children of `parent` with the given kind, in declaration order.
    pub fn children_of<'a>(
        &'a self,
        components: &'a [Component],
        parent: usize,
        kind: ComponentKind,
    ) -> impl Iterator<Item = usize> + 'a {
        (0..components.len()).filter(move |&i| {
            self.alive[i] && components[i].kind == kind && self.parents[i] == Some(parent)
        })
    }
}

/// Assigns every non-root component exactly one parent of a legal kind, or
/// drops it with a warning. Dropping cascades to descendants.
pub fn resolve(components: &[Component]) -> (Resolution, Vec<Warning>) {
    let mut by_name: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, c) in components.iter().enumerate() {
        by_name.entry(c.name.as_str()).or_default().push(i);
    }

    let mut parents = vec![None; components.len()];
    let mut dropped = vec![false; components.len()];
    let mut warnings: Vec<(usize, Warning)> = Vec::new();

    for (i, component) in components.iter().enumerate() {
        if component.kind.is_root() {
            continue;
        }
        let picked = match component.parent_name.as_deref().map(str::trim) {
            Some(name) => explicit_parent(components, &by_name, i, name),
            None => implicit_parent(components, i),
        };
        match picked {
            Ok((parent, ambiguity)) => {
                parents[i] = Some(parent);
                warnings.extend(ambiguity.map(|w| (i, w)));
            }
            Err(warning) => {
                dropped[i] = true;
                warnings.push((i, warning));
            }
        }
    }

    let mut memo = vec![None; components.len()];
    let alive: Vec<bool> = (0..components.len())
        .map(|i| is_alive(i, &parents, &dropped, &mut memo))
        .collect();

    for (i, component) in components.iter().enumerate() {
        if alive[i] || dropped[i] {
            continue;
        }
        // The parent resolved but was itself dropped.
        if let Some(parent) = parents[i] {
            warnings.push((
                i,
                Warning::UnresolvedParent {
                    kind: component.kind,
                    component: component.name.clone(),
                    parent: components[parent].name.clone(),
                    line: component.line,
                },
            ));
            parents[i] = None;
        }
    }

    warnings.sort_by_key(|(i, _)| *i);
    let warnings: Vec<Warning> = warnings.into_iter().map(|(_, w)| w).collect();
    for w in &warnings {
        log::warn!("{}", w);
    }
    (Resolution { parents, alive }, warnings)
}

fn explicit_parent(
    components: &[Component],
    by_name: &HashMap<&str, Vec<usize>>,
    child: usize,
    name: &str,
) -> Result<(usize, Option<Warning>), Warning> {
    let component = &components[child];
    let named: Vec<usize> = by_name
        .get(name)
        .map(|ids| ids.iter().copied().filter(|&i| i != child).collect())
        .unwrap_or_default();
    let legal: Vec<usize> = named
        .iter()
        .copied()
        .filter(|&i| component.kind.accepts_parent(components[i].kind))
        .collect();

    match legal.as_slice() {
        [] => Err(match named.first() {
            Some(&other) => Warning::IncompatibleParent {
                kind: component.kind,
                component: component.name.clone(),
                parent: name.to_string(),
                parent_kind: components[other].kind,
                line: component.line,
            },
            None => Warning::UnresolvedParent {
                kind: component.kind,
                component: component.name.clone(),
                parent: name.to_string(),
                line: component.line,
            },
        }),
        [only] => Ok((*only, None)),
        [first, ..] => {
            let chosen = legal
                .iter()
                .rev()
                .copied()
                .find(|&i| i < child)
                .unwrap_or(*first);
            let warning = Warning::AmbiguousParent {
                kind: component.kind,
                component: component.name.clone(),
                parent: name.to_string(),
                chosen_line: components[chosen].line,
                line: component.line,
            };
            Ok((chosen, Some(warning)))
        }
    }
}

fn implicit_parent(
    components: &[Component],
    child: usize,
) -> Result<(usize, Option<Warning>), Warning> {
    let component = &components[child];
    components[..child]
        .iter()
        .rposition(|c| component.kind.accepts_parent(c.kind))
        .map(|parent| (parent, None))
        .ok_or_else(|| Warning::UnresolvedParent {
            kind: component.kind,
            component: component.name.clone(),
            parent: component
                .kind
                .legal_parents()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" or "),
            line: component.line,
        })
}

fn is_alive(
    i: usize,
    parents: &[Option<usize>],
    dropped: &[bool],
    memo: &mut [Option<bool>],
) -> bool {
    if let Some(known) = memo[i] {
        return known;
    }
    let alive = !dropped[i]
        && match parents[i] {
            Some(parent) => is_alive(parent, parents, dropped, memo),
            None => true,
        };
    memo[i] = Some(alive);
    alive
}

/// Attaches every surviving assertion to the requests it applies to.
///
/// An assertion under a request applies to that request. One under a thread
/// group is copied onto every request of the group, or dropped with
/// [`Warning::DroppedAssertion`] when the group has none. Each request's list
/// is in declaration order.
pub fn hoist_assertions(
    components: &[Component],
    resolution: &Resolution,
) -> (HashMap<usize, Vec<usize>>, Vec<Warning>) {
    let mut attached: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut warnings = Vec::new();

    for (i, assertion) in components.iter().enumerate() {
        if assertion.kind != ComponentKind::Assertion || !resolution.alive[i] {
            continue;
        }
        let Some(parent) = resolution.parents[i] else {
            continue;
        };
        match components[parent].kind {
            ComponentKind::HttpRequest => attached.entry(parent).or_default().push(i),
            _ => {
                let requests: Vec<usize> = resolution
                    .children_of(components, parent, ComponentKind::HttpRequest)
                    .collect();
                if requests.is_empty() {
                    let warning = Warning::DroppedAssertion {
                        assertion: assertion.name.clone(),
                        thread_group: components[parent].name.clone(),
                    };
                    log::warn!("{}", warning);
                    warnings.push(warning);
                }
                log::debug!(
                    "assertion '{}' hoisted onto {} requests",
                    assertion.name,
                    requests.len()
                );
                for request in requests {
                    attached.entry(request).or_default().push(i);
                }
            }
        }
    }
    (attached, warnings)
}
