pub mod client;
pub mod handover;
pub mod invoice;
pub mod invoice_item;
pub mod product;
pub mod receipt;
pub mod staff;
pub mod user;

/// Treat blank search terms as "no filter".
pub(crate) fn search_term(q: Option<&str>) -> Option<String> {
    q.map(str::trim).filter(|q| !q.is_empty()).map(str::to_string)
}
