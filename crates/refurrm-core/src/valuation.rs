//! Photo valuation and the irreplaceable-item classifier.
//!
//! Both are capabilities: callers hold an [`ItemClassifier`] and a
//! [`ValuationEstimator`] and never depend on the keyword stub directly, so a
//! real content-analysis collaborator can replace either one.

use std::{future::Future, time::Duration};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Words that mark a description as irreplaceable.
pub const IRREPLACEABLE_KEYWORDS: [&str; 3] = ["photo", "document", "letter"];

pub const IRREPLACEABLE_REASON: &str = "Contains personal documents or photographs";

/// A reference to an uploaded image; only the URL or name is carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef(pub String);

// ─── Classification ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
  pub irreplaceable: bool,
  pub reason:        Option<String>,
}

/// Decides whether an item must be held rather than resold.
pub trait ItemClassifier: Send + Sync {
  fn classify(&self, description: &str, image: Option<&ImageRef>) -> Classification;
}

/// Case-insensitive keyword match over the description. The image is
/// ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifier;

impl ItemClassifier for KeywordClassifier {
  fn classify(&self, description: &str, _image: Option<&ImageRef>) -> Classification {
    let lowered = description.to_lowercase();
    let irreplaceable = IRREPLACEABLE_KEYWORDS.iter().any(|k| lowered.contains(k));
    Classification {
      irreplaceable,
      reason: irreplaceable.then(|| IRREPLACEABLE_REASON.to_string()),
    }
  }
}

// ─── Valuation ───────────────────────────────────────────────────────────────

/// A recently sold listing similar to the item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparable {
  pub title:     String,
  pub price:     f64,
  pub source:    String,
  pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
  pub item_name:        String,
  pub min_value:        f64,
  pub max_value:        f64,
  /// Percentage, 0–100.
  pub confidence:       u8,
  pub comparables:      Vec<Comparable>,
  pub is_irreplaceable: bool,
  pub flag_reason:      Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValuationRequest {
  pub image:       Option<ImageRef>,
  #[serde(default)]
  pub description: String,
}

/// Produces a resale estimate for a photographed item.
pub trait ValuationEstimator: Send + Sync {
  fn estimate<'a>(
    &'a self,
    request: &'a ValuationRequest,
  ) -> impl Future<Output = Result<ValuationResult>> + Send + 'a;
}

/// Placeholder estimator: waits a fixed delay and returns a canned range,
/// using `classifier` for the irreplaceable flag.
#[derive(Debug, Clone)]
pub struct StubEstimator<C> {
  classifier: C,
  delay:      Duration,
}

impl<C: ItemClassifier> StubEstimator<C> {
  pub fn new(classifier: C, delay: Duration) -> Self { Self { classifier, delay } }
}

const STUB_COMPARABLES: [(&str, f64, &str); 4] = [
  (
    "Similar vintage item",
    650.0,
    "https://d64gsuwffb70l.cloudfront.net/68e680359c90705d81386678_1759936621754_879f7f39.webp",
  ),
  (
    "Comparable antique",
    780.0,
    "https://d64gsuwffb70l.cloudfront.net/68e680359c90705d81386678_1759936623609_0319103d.webp",
  ),
  (
    "Related collectible",
    920.0,
    "https://d64gsuwffb70l.cloudfront.net/68e680359c90705d81386678_1759936625364_51b346de.webp",
  ),
  (
    "Similar condition item",
    550.0,
    "https://d64gsuwffb70l.cloudfront.net/68e680359c90705d81386678_1759936630781_8dad33d6.webp",
  ),
];

impl<C: ItemClassifier> ValuationEstimator for StubEstimator<C> {
  async fn estimate(&self, request: &ValuationRequest) -> Result<ValuationResult> {
    tokio::time::sleep(self.delay).await;

    let Classification { irreplaceable, reason } = self
      .classifier
      .classify(&request.description, request.image.as_ref());

    let item_name = if request.description.trim().is_empty() {
      "Vintage Item".to_string()
    } else {
      request.description.clone()
    };

    Ok(ValuationResult {
      item_name,
      min_value: 500.0,
      max_value: 1000.0,
      confidence: 87,
      comparables: STUB_COMPARABLES
        .iter()
        .map(|(title, price, url)| Comparable {
          title:     (*title).to_string(),
          price:     *price,
          source:    "eBay".to_string(),
          image_url: (*url).to_string(),
        })
        .collect(),
      is_irreplaceable: irreplaceable,
      flag_reason: reason,
    })
  }
}
