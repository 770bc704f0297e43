use std::{env, fs, path::PathBuf};

use ts_rs::TS;

fn generate_types_content() -> String {
    let decls = [
        db::models::client::Client::decl(),
        db::models::client::CreateClient::decl(),
        db::models::client::UpdateClient::decl(),
        db::models::staff::Staff::decl(),
        db::models::staff::CreateStaff::decl(),
        db::models::staff::UpdateStaff::decl(),
        db::models::product::Product::decl(),
        db::models::product::ProductPayload::decl(),
        db::models::product::ProductSearch::decl(),
        db::models::invoice::InvoiceStatus::decl(),
        db::models::invoice::Invoice::decl(),
        db::models::invoice::InvoiceSummary::decl(),
        db::models::invoice::CreateInvoice::decl(),
        db::models::invoice::CreatedInvoice::decl(),
        db::models::invoice::UpdateInvoiceHeader::decl(),
        db::models::invoice::InvoiceSearch::decl(),
        db::models::invoice_item::InvoiceItem::decl(),
        db::models::invoice_item::CreateInvoiceItem::decl(),
        db::models::receipt::Receipt::decl(),
        db::models::receipt::CreateReceipt::decl(),
        db::models::receipt::UpdateReceipt::decl(),
        db::models::handover::HandoverLetter::decl(),
        db::models::handover::CreateHandoverLetter::decl(),
        db::models::handover::UpdateHandoverLetter::decl(),
        db::models::user::UserProfile::decl(),
        services::services::invoices::InvoiceDetail::decl(),
        services::services::receipts::CreateReceiptByCode::decl(),
        services::services::auth::Claims::decl(),
        services::services::auth::AuthSession::decl(),
        services::services::auth::RegisterRequest::decl(),
        services::services::auth::LoginRequest::decl(),
    ];

    let mut out = String::from(
        "// This file was generated by `cargo run --bin generate_types`. Do not edit.\n\n",
    );
    out.push_str(
        "export type ApiResponse<T, E = T> = { success: boolean, data: T | null, \
         error_data: E | null, message: string | null };\n\n",
    );
    for decl in decls {
        out.push_str("export ");
        out.push_str(&decl);
        out.push_str("\n\n");
    }
    out
}

fn main() -> std::io::Result<()> {
    let content = generate_types_content();
    match env::args().nth(1).map(PathBuf::from) {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{content}"),
    }
    Ok(())
}
