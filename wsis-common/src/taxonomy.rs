//! Static inspection taxonomy
//!
//! The fixed site list and category/subcategory tree that shapes every
//! weekly report. Pure configuration data, never mutated at runtime.
//! Every submitted report must carry exactly this shape: all leaves
//! present (possibly empty), no unknown ids.

use crate::model::{CategoryMap, SubcategoryFields};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// One inspection subcategory (a taxonomy leaf)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Subcategory {
    pub id: &'static str,
    pub name: &'static str,
}

/// One top-level inspection category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub subcategories: &'static [Subcategory],
}

/// Fixed, ordered list of construction sites
pub const SITES: &[&str] = &[
    "현장 A", "현장 B", "현장 C", "현장 D", "현장 E", "현장 F", "현장 G",
    "현장 H", "현장 I", "현장 J", "현장 K",
];

/// Fixed category tree, in display order
pub const CATEGORIES: &[Category] = &[
    Category {
        id: "riskAssessment",
        name: "위험성평가",
        subcategories: &[
            Subcategory { id: "ra_weekly", name: "1.1 주간 위험성평가 실시" },
            Subcategory { id: "ra_measures", name: "1.2 위험성감소대책 이행" },
            Subcategory { id: "ra_participation", name: "1.3 근로자 참여" },
        ],
    },
    Category {
        id: "tbm",
        name: "TBM (Tool Box Meeting)",
        subcategories: &[
            Subcategory { id: "tbm_inspection", name: "2.1 작업전 안전점검" },
            Subcategory { id: "tbm_nearmiss", name: "2.2 안전제안/아차사고" },
        ],
    },
    Category {
        id: "training",
        name: "안전보건교육",
        subcategories: &[
            Subcategory { id: "tr_new", name: "3.1 신규채용자교육" },
            Subcategory { id: "tr_change", name: "3.2 작업내용 변경교육" },
            Subcategory { id: "tr_special", name: "3.3 특별안전교육" },
            Subcategory { id: "tr_regular_worker", name: "3.4 정기안전교육(근로자)" },
            Subcategory { id: "tr_regular_manager", name: "3.5 정기안전교육(관리감독자)" },
        ],
    },
    Category {
        id: "inspection",
        name: "안전점검",
        subcategories: &[
            Subcategory { id: "insp_joint", name: "4.1 합동안전점검" },
            Subcategory { id: "insp_owner", name: "4.2 사업주 순회점검" },
            Subcategory { id: "insp_manager", name: "4.3 관리감독자 순회점검" },
            Subcategory { id: "insp_safety", name: "4.4 안전관리자 순회점검" },
            Subcategory { id: "insp_followup", name: "4.5 점검 후속조치(지적사항)" },
        ],
    },
    Category {
        id: "contractor",
        name: "도급/협력사 관리",
        subcategories: &[
            Subcategory { id: "cont_council", name: "5.1 안전보건협의체" },
            Subcategory { id: "cont_ptw", name: "5.2 위험작업허가(PTW)" },
            Subcategory { id: "cont_plan", name: "5.3 작업계획수립" },
        ],
    },
    Category {
        id: "emergency",
        name: "비상대응",
        subcategories: &[
            Subcategory { id: "em_check", name: "6.1 비상자재 재고 점검" },
            Subcategory { id: "em_drill", name: "6.2 비상대응훈련" },
        ],
    },
];

/// True when `site` is one of the fixed site names
pub fn is_known_site(site: &str) -> bool {
    SITES.contains(&site)
}

/// Build the fully-populated empty category shape (form reset state)
pub fn empty_categories() -> CategoryMap {
    let mut map = CategoryMap::new();
    for cat in CATEGORIES {
        let mut subs = BTreeMap::new();
        for sub in cat.subcategories {
            subs.insert(sub.id.to_string(), SubcategoryFields::default());
        }
        map.insert(cat.id.to_string(), subs);
    }
    map
}

/// Normalize submitted categories against the taxonomy.
///
/// Missing leaves are filled with empty fields so every stored report
/// carries the full shape. Unknown category or subcategory ids are
/// rejected rather than silently stored.
pub fn normalize(input: &CategoryMap) -> Result<CategoryMap> {
    for (cat_id, subs) in input {
        let cat = CATEGORIES
            .iter()
            .find(|c| c.id == cat_id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown category: {}", cat_id)))?;
        for sub_id in subs.keys() {
            if !cat.subcategories.iter().any(|s| s.id == sub_id) {
                return Err(Error::InvalidInput(format!(
                    "unknown subcategory: {}/{}",
                    cat_id, sub_id
                )));
            }
        }
    }

    let mut normalized = empty_categories();
    for (cat_id, subs) in input {
        for (sub_id, fields) in subs {
            // Both levels verified above
            if let Some(slot) = normalized.get_mut(cat_id).and_then(|m| m.get_mut(sub_id)) {
                *slot = fields.clone();
            }
        }
    }
    Ok(normalized)
}
