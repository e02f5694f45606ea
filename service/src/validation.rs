// service/src/validation.rs

//! Pre-submission asset checks. Pure: no I/O, no clock.

use serde::Serialize;

use crate::models::{BindingType, PrintableAssets};

pub const MIN_PAGES_CASE_BOUND: u32 = 24;
pub const MIN_PAGES_SOFT_BOUND: u32 = 8;
pub const PAGE_MULTIPLE: u32 = 4;
/// Thickest block the vendor binds.
pub const MAX_INTERIOR_PAGES: u32 = 800;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
  pub valid: bool,
  pub errors: Vec<String>,
}

impl ValidationReport {
  fn from_errors(errors: Vec<String>) -> Self {
    Self {
      valid: errors.is_empty(),
      errors,
    }
  }
}

fn missing(reference: &Option<String>) -> bool {
  reference.as_deref().map_or(true, |s| s.trim().is_empty())
}

pub fn min_pages_for(binding: BindingType) -> u32 {
  match binding {
    BindingType::Case => MIN_PAGES_CASE_BOUND,
    BindingType::Perfect | BindingType::SaddleStitch => MIN_PAGES_SOFT_BOUND,
  }
}

/// Checks files, page rules and quantity, reporting every failure found.
///
/// Missing files short-circuit: page rules are meaningless without an interior.
pub fn validate(printable: &PrintableAssets, quantity: u32) -> ValidationReport {
  let mut errors = Vec::new();

  if missing(&printable.cover_pdf_url) {
    errors.push("cover PDF is missing".to_string());
  }
  if missing(&printable.interior_pdf_url) {
    errors.push("interior PDF is missing".to_string());
  }
  if !errors.is_empty() {
    return ValidationReport::from_errors(errors);
  }

  let pages = printable.interior_page_count;
  let min_pages = min_pages_for(printable.binding);
  if pages < min_pages {
    errors.push(format!(
      "minimum page count for {} binding is {min_pages}, got {pages}",
      printable.binding.as_str()
    ));
  }
  if pages > MAX_INTERIOR_PAGES {
    errors.push(format!("maximum interior page count is {MAX_INTERIOR_PAGES}, got {pages}"));
  }
  if pages % PAGE_MULTIPLE != 0 {
    errors.push(format!("interior page count must be a multiple of {PAGE_MULTIPLE}, got {pages}"));
  }
  if quantity < 1 {
    errors.push("quantity must be at least 1".to_string());
  }

  ValidationReport::from_errors(errors)
}
