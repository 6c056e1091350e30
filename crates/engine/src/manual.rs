use construye_catalog::Catalog;
use serde::{Deserialize, Serialize};

use crate::estimator::{BillOfMaterials, MaterialItem};

/// A construction stage with the bill lines it consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualStage {
    pub level: String,
    pub title: String,
    pub description: String,
    /// Key into the external video catalog
    pub guide: String,
    pub materials: Vec<MaterialItem>,
}

#[must_use]
pub fn build_manual(bill: &BillOfMaterials, catalog: &Catalog) -> Vec<ManualStage> {
    catalog
        .manual()
        .iter()
        .map(|stage| {
            let take = stage.material_lines.unwrap_or(bill.items.len());
            ManualStage {
                level: stage.level.clone(),
                title: stage.title.clone(),
                description: stage.description.clone(),
                guide: stage.guide.clone(),
                materials: bill.items.iter().take(take).cloned().collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use construye_catalog::FinishTier;
    use pretty_assertions::assert_eq;

    fn item(name: &str) -> MaterialItem {
        MaterialItem {
            name: name.to_string(),
            quantity: 1.0,
            unit: "m²".to_string(),
            unit_cost: 1.0,
            total: 1.0,
        }
    }

    #[test]
    fn stages_take_growing_slices_of_the_bill() {
        let bill = BillOfMaterials {
            finish_tier: FinishTier::Standard,
            items: ["a", "b", "c", "d", "e"].into_iter().map(item).collect(),
            subtotal: 5.0,
            contingency: 0.4,
            estimated_total: 5.4,
        };
        let manual = build_manual(&bill, Catalog::bundled());
        let sizes: Vec<_> = manual.iter().map(|stage| stage.materials.len()).collect();
        assert_eq!(sizes, vec![2, 3, 5]);
        assert_eq!(manual[0].level, "principiante");
        assert_eq!(manual[2].guide, "acabados_finales");
    }

    #[test]
    fn short_bills_are_not_padded() {
        let bill = BillOfMaterials {
            finish_tier: FinishTier::Economy,
            items: vec![item("a")],
            subtotal: 1.0,
            contingency: 0.08,
            estimated_total: 1.08,
        };
        let manual = build_manual(&bill, Catalog::bundled());
        assert!(manual.iter().all(|stage| stage.materials.len() == 1));
    }
}
