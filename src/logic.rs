use itertools::Itertools;
use varisat::Lit;

fn invert(lit: Lit) -> Lit {
    match lit.is_negative() {
        true => lit.var().positive(),
        false => lit.var().negative(),
    }
}

/// Clauses forcing exactly one of `lits` true: pairwise at-most-one plus a
/// single at-least-one clause. Quadratic, which is fine at n ≤ 20.
pub(crate) fn exactly_one(lits: Vec<Lit>) -> Vec<Vec<Lit>> {
    let mut clauses = Vec::with_capacity(lits.len() * (lits.len() + 1) / 2 + 1);

    // no two are true; (!A + !B) * (!A + !C) * ...
    clauses.extend(
        lits.iter()
            .tuple_combinations()
            .map(|(&a, &b)| vec![invert(a), invert(b)]),
    );
    // at least one is true; A + B + C + ...
    clauses.push(lits);

    clauses
}
