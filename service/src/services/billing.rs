// service/src/services/billing.rs

use tracing::warn;

use crate::config::BillingConfig;
use crate::models::PostalAddress;

/// The address the vendor invoices. `None` when the configuration is
/// incomplete; submission proceeds without one.
pub fn resolve_billing_address(billing: &BillingConfig) -> Option<PostalAddress> {
  let (Some(name), Some(line1), Some(country)) = (&billing.name, &billing.line1, &billing.country) else {
    warn!("Billing address not configured (need name, line1 and country); submitting without one.");
    return None;
  };
  Some(PostalAddress {
    name: name.clone(),
    line1: line1.clone(),
    line2: None,
    city: billing.city.clone().unwrap_or_default(),
    region: None,
    postal_code: billing.postal_code.clone().unwrap_or_default(),
    country_code: country.clone(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn incomplete_config_resolves_to_none() {
    let billing = BillingConfig {
      name: Some("Storybook Ltd".into()),
      line1: None,
      city: Some("Leeds".into()),
      postal_code: None,
      country: Some("GB".into()),
    };
    assert!(resolve_billing_address(&billing).is_none());
  }

  #[test]
  fn complete_config_resolves() {
    let billing = BillingConfig {
      name: Some("Storybook Ltd".into()),
      line1: Some("2 Mill St".into()),
      city: None,
      postal_code: None,
      country: Some("GB".into()),
    };
    let address = resolve_billing_address(&billing).unwrap();
    assert_eq!(address.country_code, "GB");
    assert_eq!(address.city, "");
  }
}
