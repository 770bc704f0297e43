pub mod auth;
pub mod database_validator;
pub mod handovers;
pub mod invoice_code;
pub mod invoices;
pub mod receipts;
pub mod staff;
