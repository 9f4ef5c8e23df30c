use chrono::Utc;
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Customer;

/// Strips everything but ASCII digits.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validates an already-normalized phone: 11 digits, not all identical,
/// area code 11-99, and '9' as the mobile-indicator digit.
pub fn validate_phone(digits: &str) -> Result<(), AppError> {
    if digits.len() != 11 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::InvalidPhone(
            "expected 11 digits, e.g. 11999999999".to_string(),
        ));
    }

    let first = digits.chars().next().unwrap_or('0');
    if digits.chars().all(|c| c == first) {
        return Err(AppError::InvalidPhone("all digits identical".to_string()));
    }

    let area: u32 = digits[..2].parse().unwrap_or(0);
    if !(11..=99).contains(&area) {
        return Err(AppError::InvalidPhone(format!("invalid area code {area}")));
    }

    if digits.as_bytes()[2] != b'9' {
        return Err(AppError::InvalidPhone(
            "mobile numbers must have 9 after the area code".to_string(),
        ));
    }

    Ok(())
}

/// Email is optional; when present it must look like local@domain.tld.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Ok(());
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(AppError::InvalidEmail(email.to_string())),
    };

    let domain_ok = domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Finds or creates the customer for a normalized phone. An existing record
/// gets name/email overwritten when the caller supplies different non-empty
/// values (last write wins, no audit trail).
pub fn resolve_customer(
    conn: &Connection,
    name: &str,
    phone_raw: &str,
    email: &str,
) -> Result<Customer, AppError> {
    let phone = normalize_phone(phone_raw);
    validate_phone(&phone)?;
    validate_email(email)?;

    match queries::get_customer_by_phone(conn, &phone)? {
        None => {
            let now = Utc::now().naive_utc();
            let customer = Customer {
                id: Uuid::new_v4().to_string(),
                name: name.to_string(),
                phone,
                email: email.to_string(),
                created_at: now,
                updated_at: now,
            };
            queries::insert_customer(conn, &customer)?;
            tracing::info!(id = %customer.id, "created customer");
            Ok(customer)
        }
        Some(mut existing) => {
            let new_name = (!name.is_empty() && name != existing.name).then_some(name);
            let new_email = (!email.is_empty() && email != existing.email).then_some(email);

            if new_name.is_some() || new_email.is_some() {
                queries::update_customer_contact(conn, &existing.id, new_name, new_email)?;
                if let Some(n) = new_name {
                    existing.name = n.to_string();
                }
                if let Some(e) = new_email {
                    existing.email = e.to_string();
                }
            }
            Ok(existing)
        }
    }
}
