//! Estado transition table.
//!
//! Lists the targets an operator may pick from a given estado. It feeds the
//! unit detail and estado metadata, and the state change precondition checks
//! requests against it before the repository is called.

use shared::Estado;

const FROM_LIBRE: [Estado; 2] = [Estado::Bloqueada, Estado::Reservada];
const FROM_BLOQUEADA: [Estado; 2] = [Estado::Libre, Estado::Reservada];
const FROM_RESERVADA: [Estado; 2] = [Estado::Libre, Estado::Bloqueada];

/// Ordered set of estados reachable in one step from `current`
pub fn allowed_targets(current: Estado) -> &'static [Estado] {
    match current {
        Estado::Libre => &FROM_LIBRE,
        Estado::Bloqueada => &FROM_BLOQUEADA,
        Estado::Reservada => &FROM_RESERVADA,
    }
}

pub fn is_allowed(from: Estado, to: Estado) -> bool {
    allowed_targets(from).contains(&to)
}
