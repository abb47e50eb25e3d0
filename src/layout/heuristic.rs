//! Alternate ("six button fighter") layout detection
//!
//! The running application declares its controls as `(name, info)` pairs,
//! e.g. `("P1 Weak Punch", "p1 fire 1")`, plus a hardware family. When
//! player 1 has enough fire controls and the family is one of the
//! configured ones, each player's `sfLayout` block replaces its buttons.

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_FIRE_THRESHOLD: usize = 5;

/// Hardware family of the running application
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareFamily {
    Cps1,
    Cps2,
    Cps3,
    Neogeo,
    Pgm,
    #[serde(other)]
    Other,
}

impl HardwareFamily {
    pub fn default_alternates() -> Vec<HardwareFamily> {
        vec![HardwareFamily::Cps1, HardwareFamily::Cps2, HardwareFamily::Cps3]
    }
}

/// One declared control of the running application
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlInfo {
    pub name: String,
    pub info: String,
}

impl ControlInfo {
    pub fn new(name: impl Into<String>, info: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            info: info.into(),
        }
    }

    /// Zero-based player, from a `P1`..`P4` name prefix or, failing that,
    /// a `p1`..`p4` info prefix
    pub fn player(&self) -> Option<usize> {
        let from_name = player_digit(&self.name, false);
        let from_info = player_digit(&self.info, true);
        match (from_name, from_info) {
            (Some(0), Some(info)) => Some(info),
            (Some(name), _) => Some(name),
            (None, info) => info,
        }
    }

    pub fn is_fire(&self) -> bool {
        self.info.get(2..).is_some_and(|rest| rest.starts_with(" fire"))
    }
}

// Helper
fn player_digit(text: &str, any_case: bool) -> Option<usize> {
    let bytes = text.as_bytes();
    let prefix = *bytes.first()?;
    let digit = *bytes.get(1)?;
    let prefix_ok = prefix == b'P' || (any_case && prefix == b'p');
    (prefix_ok && (b'1'..=b'4').contains(&digit)).then(|| (digit - b'1') as usize)
}

/// The running application's declared controls
pub trait ControlInfoProvider {
    fn controls(&self) -> Vec<ControlInfo>;

    fn hardware_family(&self) -> HardwareFamily;
}

/// Provider for when no application is loaded
#[derive(Clone, Copy, Debug, Default)]
pub struct NoControls;

impl ControlInfoProvider for NoControls {
    fn controls(&self) -> Vec<ControlInfo> {
        Vec::new()
    }

    fn hardware_family(&self) -> HardwareFamily {
        HardwareFamily::Other
    }
}

/// Fixed list of controls
#[derive(Clone, Debug)]
pub struct DeclaredControls {
    pub controls: Vec<ControlInfo>,
    pub family: HardwareFamily,
}

impl ControlInfoProvider for DeclaredControls {
    fn controls(&self) -> Vec<ControlInfo> {
        self.controls.clone()
    }

    fn hardware_family(&self) -> HardwareFamily {
        self.family
    }
}

#[derive(Clone, Debug)]
pub struct LayoutHeuristic {
    pub fire_threshold: usize,
    pub families: Vec<HardwareFamily>,
}

impl LayoutHeuristic {
    pub fn new(fire_threshold: usize, families: Vec<HardwareFamily>) -> Self {
        Self {
            fire_threshold,
            families,
        }
    }

    /// Player 1 fire controls
    pub fn fire_buttons(&self, provider: &dyn ControlInfoProvider) -> usize {
        provider
            .controls()
            .iter()
            .filter(|control| control.player() == Some(0) && control.is_fire())
            .count()
    }

    pub fn uses_alternate_layout(&self, provider: &dyn ControlInfoProvider) -> bool {
        let fire = self.fire_buttons(provider);
        let family = provider.hardware_family();
        let alternate = fire >= self.fire_threshold && self.families.contains(&family);
        debug!(
            "Layout heuristic: {} fire button(s), family {:?}, alternate layout: {}",
            fire, family, alternate
        );
        alternate
    }
}

impl Default for LayoutHeuristic {
    fn default() -> Self {
        Self::new(DEFAULT_FIRE_THRESHOLD, HardwareFamily::default_alternates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fighter(fire: usize, family: HardwareFamily) -> DeclaredControls {
        let mut controls = vec![
            ControlInfo::new("P1 Coin", "p1 coin"),
            ControlInfo::new("P1 Up", "p1 up"),
        ];
        for i in 0..fire {
            controls.push(ControlInfo::new(format!("P1 Button {}", i + 1), format!("p1 fire {}", i + 1)));
        }
        controls.push(ControlInfo::new("P2 Button 1", "p2 fire 1"));
        DeclaredControls { controls, family }
    }

    #[test]
    fn player_prefers_name_then_info() {
        assert_eq!(ControlInfo::new("P2 Start", "p2 start").player(), Some(1));
        assert_eq!(ControlInfo::new("Coin 1", "p1 coin").player(), Some(0));
        assert_eq!(ControlInfo::new("P1 Jab", "p3 fire 1").player(), Some(2));
        assert_eq!(ControlInfo::new("p1 jab", "P5 fire").player(), None);
        assert_eq!(ControlInfo::new("", "").player(), None);
    }

    #[test]
    fn six_fire_buttons_on_cps_use_alternate_layout() {
        let heuristic = LayoutHeuristic::default();
        assert_eq!(heuristic.fire_buttons(&fighter(6, HardwareFamily::Cps2)), 6);
        assert!(heuristic.uses_alternate_layout(&fighter(6, HardwareFamily::Cps2)));
        assert!(heuristic.uses_alternate_layout(&fighter(5, HardwareFamily::Cps1)));
    }

    #[test]
    fn too_few_buttons_or_other_family_keep_standard_layout() {
        let heuristic = LayoutHeuristic::default();
        assert!(!heuristic.uses_alternate_layout(&fighter(4, HardwareFamily::Cps3)));
        assert!(!heuristic.uses_alternate_layout(&fighter(6, HardwareFamily::Neogeo)));
        assert!(!heuristic.uses_alternate_layout(&NoControls));
    }

    #[test]
    fn family_names_deserialize_lowercase() {
        let families: Vec<HardwareFamily> = serde_json::from_str(r#"["cps1","neogeo","sega"]"#).unwrap();
        assert_eq!(
            families,
            vec![HardwareFamily::Cps1, HardwareFamily::Neogeo, HardwareFamily::Other]
        );
    }
}
