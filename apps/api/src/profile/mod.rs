// Student profiles: view/edit, derived average, and roster reconciliation of
// extracted names and grades. All persistence goes through `store::StudentStore`.

pub mod handlers;
pub mod reconciler;
pub mod roster;
