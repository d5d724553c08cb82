use super::ui;
use crate::core::ledger::{Account, format_balance};
use comfy_table::Cell;
use rust_decimal::Decimal;

pub fn display_as_table(accounts: &[Account]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Account"),
        ui::header_cell("Type"),
        ui::header_cell("Currency"),
        ui::header_cell("Balance"),
    ]);

    for account in accounts {
        let balance = format_balance(account.balance, &account.currency);
        if account.is_active {
            table.add_row(vec![
                Cell::new(&account.name),
                Cell::new(account.account_type.to_string()),
                Cell::new(account.currency.as_str()),
                ui::amount_cell(balance, account.balance < Decimal::ZERO),
            ]);
        } else {
            table.add_row(vec![
                ui::subtle_cell(&format!("{} (inactive)", account.name)),
                ui::subtle_cell(&account.account_type.to_string()),
                ui::subtle_cell(account.currency.as_str()),
                ui::subtle_cell(&balance),
            ]);
        }
    }

    table.to_string()
}

pub fn run(accounts: &[Account]) {
    if accounts.is_empty() {
        println!(
            "{}",
            ui::style_text("No accounts configured", ui::StyleType::Subtle)
        );
        return;
    }
    println!("{}", display_as_table(accounts));
}
