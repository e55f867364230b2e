//! Customer contact and shipping details captured at checkout.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Snapshot of the customer form submitted with a checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl Customer {
    /// Returns `(field name, value)` pairs in form order.
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("name", self.name.as_str()),
            ("email", self.email.as_str()),
            ("address", self.address.as_str()),
            ("city", self.city.as_str()),
            ("postal_code", self.postal_code.as_str()),
            ("country", self.country.as_str()),
        ]
    }

    /// Returns the customer with surrounding whitespace removed from every
    /// field. Orders are stored in this form so email lookups agree across
    /// stores.
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }

    /// Checks that every field is present and the email is plausible.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in self.fields() {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingCustomerField(field));
            }
        }

        if !is_plausible_email(self.email.trim()) {
            return Err(ValidationError::InvalidEmail(self.email.clone()));
        }

        Ok(())
    }

    /// Returns true if this customer's email matches `email`, ignoring case.
    pub fn has_email(&self, email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(email.trim())
    }
}

// local@domain.tld with no whitespace
fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> Customer {
        Customer {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Row".to_string(),
            city: "London".to_string(),
            postal_code: "N1 9GU".to_string(),
            country: "UK".to_string(),
        }
    }

    #[test]
    fn complete_customer_is_valid() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn blank_field_is_reported_by_name() {
        let mut customer = complete();
        customer.city = "   ".to_string();
        assert_eq!(
            customer.validate(),
            Err(ValidationError::MissingCustomerField("city"))
        );

        let mut customer = complete();
        customer.postal_code.clear();
        assert_eq!(
            customer.validate(),
            Err(ValidationError::MissingCustomerField("postal_code"))
        );
    }

    #[test]
    fn implausible_email_is_rejected() {
        for email in ["ada", "ada@", "@example.com", "ada@example", "a da@example.com"] {
            let mut customer = complete();
            customer.email = email.to_string();
            assert!(
                matches!(customer.validate(), Err(ValidationError::InvalidEmail(_))),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn email_match_ignores_case() {
        assert!(complete().has_email("ADA@example.com"));
        assert!(!complete().has_email("bob@example.com"));
    }
}
