//! Tests for palette records as they arrive from job files.

use map_common::color::{CodecVariant, Rgba};
use map_common::style::{Gradient, Palette, NON_APPLICABLE_CODE};
use map_common::{BoundingBox, MapError, ReclassTable};

// ============================================================================
// YAML palettes
// ============================================================================

#[test]
fn test_palette_from_yaml() {
    let yaml = r##"
name: ammap
entries:
  - code: -1
    color: "#00000000"
    description: No management
  - code: 1
    color: "#2B8CBE"
    description: Asparagopsis taxiformis
  - code: 2
    color: "A6BDDB"
    description: Precision agriculture
"##;
    let palette: Palette = serde_yaml::from_str(yaml).unwrap();
    palette.validate().unwrap();

    let table = palette.color_table(CodecVariant::Categorical).unwrap();
    // zero channels are raised but alpha is preserved
    assert_eq!(table.get(-1), Some(Rgba::new(1, 1, 1, 0)));
    assert_eq!(table.get(2), Some(Rgba::new(0xA6, 0xBD, 0xDB, 255)));

    let exact = palette.color_table(CodecVariant::Exact).unwrap();
    assert_eq!(exact.get(-1), Some(Rgba::TRANSPARENT));
}

#[test]
fn test_reclass_table_from_yaml() {
    let yaml = "1: 10\n2: 20\n-1: -128\n";
    let table: ReclassTable = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(table.lookup(1), 10);
    assert_eq!(table.lookup(-1), -128);
    assert_eq!(table.lookup(7), 7);
}

#[test]
fn test_empty_palette_is_rejected() {
    let palette = Palette {
        name: None,
        entries: Vec::new(),
    };
    assert!(matches!(palette.validate(), Err(MapError::Config(_))));
}

// ============================================================================
// Gradients
// ============================================================================

#[test]
fn test_gradient_table_is_monotonic_in_green() {
    // yellow → red: the green channel never increases along the ramp
    let table = Gradient::yl_or_rd().color_table(100).unwrap();
    let greens: Vec<u8> = (0..=100).map(|i| table.get(i).unwrap().g).collect();
    assert!(greens.windows(2).all(|w| w[0] >= w[1]));
    assert!(table.get(NON_APPLICABLE_CODE).is_some());
}

// ============================================================================
// Bounding boxes
// ============================================================================

#[test]
fn test_bbox_center_and_covers() {
    let outer = BoundingBox::new(110.0, -45.0, 155.0, -10.0);
    let inner = BoundingBox::new(112.0, -44.0, 154.0, -11.0);
    assert_eq!(outer.center(), (132.5, -27.5));
    assert!(outer.covers(&inner, 0.0));
    assert!(!inner.covers(&outer, 0.0));
    assert!(inner.covers(&outer, 2.0));
}
