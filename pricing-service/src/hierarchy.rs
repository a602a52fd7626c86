//! Hierarchical service item tree construction
//!
//! Converts the flat, persisted item list of one catalog service into the
//! nested tree the pricing UI renders. The tree is rebuilt on every read
//! and discarded after the response is serialized.

use std::collections::{HashMap, HashSet};

use tracing::warn;
use uuid::Uuid;

use crate::models::{CareService, HierarchicalService, ServiceItem, ServiceItemNode};

/// Build the item tree rooted at `parent_id` (`None` for top level).
///
/// Items are grouped by parent in a single pass, then each level is sorted
/// by `sort_order` ascending with ties broken by `name` ascending, so the
/// output is deterministic for identical input. Items whose parent chain
/// never reaches `parent_id` (orphaned parents, parent cycles) are omitted.
pub fn build_hierarchy(items: &[ServiceItem], parent_id: Option<Uuid>) -> Vec<ServiceItemNode> {
    let mut children_of: HashMap<Option<Uuid>, Vec<&ServiceItem>> = HashMap::new();
    for item in items {
        children_of.entry(item.parent_id).or_default().push(item);
    }
    for bucket in children_of.values_mut() {
        bucket.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.name.cmp(&b.name))
        });
    }

    let mut visited = HashSet::with_capacity(items.len());
    let nodes = build_level(&children_of, parent_id, &mut visited);

    // Only a full scan from the root can tell orphans apart from items that
    // legitimately sit above the requested subtree.
    if parent_id.is_none() && visited.len() < items.len() {
        warn!(
            omitted = items.len() - visited.len(),
            "service items unreachable from root (orphaned parent or cycle), omitted from hierarchy"
        );
    }

    nodes
}

fn build_level(
    children_of: &HashMap<Option<Uuid>, Vec<&ServiceItem>>,
    parent_id: Option<Uuid>,
    visited: &mut HashSet<Uuid>,
) -> Vec<ServiceItemNode> {
    let Some(bucket) = children_of.get(&parent_id) else {
        return Vec::new();
    };

    let mut nodes = Vec::with_capacity(bucket.len());
    for item in bucket {
        if !visited.insert(item.id) {
            warn!(item_id = %item.id, "parent cycle in service items, skipping");
            continue;
        }
        nodes.push(ServiceItemNode {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            level: item.level,
            is_optional: !item.is_required,
            base_price: item.base_price(),
            sort_order: item.sort_order,
            children: build_level(children_of, Some(item.id), visited),
        });
    }
    nodes
}

impl HierarchicalService {
    /// Wrap a catalog service and its (already fetched) flat item list into
    /// the hierarchical response shape.
    pub fn from_parts(service: &CareService, items: &[ServiceItem]) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
            description: service.description.clone(),
            base_price: service.base_price(),
            items: build_hierarchy(items, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn item(
        id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
        sort_order: i32,
        is_required: bool,
        daily: Option<Decimal>,
    ) -> ServiceItem {
        ServiceItem {
            id,
            service_id: Uuid::nil(),
            parent_id,
            name: name.to_string(),
            description: None,
            level: 0,
            is_required,
            base_price_daily: daily,
            base_price_monthly: None,
            base_price_hourly: None,
            sort_order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_input_yields_empty_tree() {
        assert!(build_hierarchy(&[], None).is_empty());
    }

    #[test]
    fn basic_care_with_optional_wound_care_child() {
        let root_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let items = vec![
            item(root_id, None, "Basic Care", 1, true, Some(dec!(100))),
            item(child_id, Some(root_id), "Wound Care", 1, false, Some(dec!(20))),
        ];

        let tree = build_hierarchy(&items, None);
        assert_eq!(tree.len(), 1);
        let root = &tree[0];
        assert_eq!(root.name, "Basic Care");
        assert!(!root.is_optional);
        assert_eq!(root.base_price, dec!(100));
        assert_eq!(root.children.len(), 1);
        let child = &root.children[0];
        assert_eq!(child.name, "Wound Care");
        assert!(child.is_optional);
        assert_eq!(child.base_price, dec!(20));
        assert!(child.children.is_empty());
    }

    #[test]
    fn levels_sort_by_sort_order_then_name() {
        let items = vec![
            item(Uuid::new_v4(), None, "Bathing", 2, true, None),
            item(Uuid::new_v4(), None, "Meal Prep", 1, true, None),
            item(Uuid::new_v4(), None, "Companionship", 2, false, None),
        ];

        let tree = build_hierarchy(&items, None);
        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Meal Prep", "Bathing", "Companionship"]);
    }

    #[test]
    fn identical_input_builds_identical_trees() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let items = vec![
            item(a, None, "Skilled Nursing", 1, true, Some(dec!(180))),
            item(b, Some(a), "Injection", 1, false, Some(dec!(15))),
            item(Uuid::new_v4(), Some(a), "Dressing Change", 1, false, None),
        ];
        assert_eq!(build_hierarchy(&items, None), build_hierarchy(&items, None));
    }

    #[test]
    fn orphaned_items_are_omitted() {
        let root = Uuid::new_v4();
        let items = vec![
            item(root, None, "Respite Care", 1, true, None),
            item(Uuid::new_v4(), Some(Uuid::new_v4()), "Ghost", 1, false, None),
        ];

        let tree = build_hierarchy(&items, None);
        assert_eq!(tree.len(), 1);
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn every_rooted_item_appears_exactly_once() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let items = vec![
            item(a, None, "A", 1, true, None),
            item(b, Some(a), "B", 1, true, None),
            item(c, Some(b), "C", 1, true, None),
        ];

        let tree = build_hierarchy(&items, None);
        let mut seen = Vec::new();
        fn collect(nodes: &[ServiceItemNode], out: &mut Vec<Uuid>) {
            for node in nodes {
                out.push(node.id);
                collect(&node.children, out);
            }
        }
        collect(&tree, &mut seen);
        seen.sort();
        let mut expected = vec![a, b, c];
        expected.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn parent_cycle_does_not_hang_the_builder() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        // a and b point at each other; neither chains to the root.
        let items = vec![
            item(a, Some(b), "A", 1, true, None),
            item(b, Some(a), "B", 1, true, None),
            item(Uuid::new_v4(), None, "Root", 1, true, None),
        ];

        let tree = build_hierarchy(&items, None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Root");
    }

    #[test]
    fn subtree_build_starts_at_requested_parent() {
        let root = Uuid::new_v4();
        let mid = Uuid::new_v4();
        let items = vec![
            item(root, None, "Root", 1, true, None),
            item(mid, Some(root), "Mid", 1, true, None),
            item(Uuid::new_v4(), Some(mid), "Leaf", 1, false, None),
        ];

        let subtree = build_hierarchy(&items, Some(root));
        assert_eq!(subtree.len(), 1);
        assert_eq!(subtree[0].name, "Mid");
        assert_eq!(subtree[0].children.len(), 1);
    }

    #[test]
    fn hierarchical_service_uses_price_fallback() {
        let service = CareService {
            id: Uuid::new_v4(),
            name: "Post-Surgery Care".to_string(),
            description: None,
            base_price_daily: None,
            base_price_monthly: Some(dec!(1200)),
            base_price_hourly: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let wrapped = HierarchicalService::from_parts(&service, &[]);
        assert_eq!(wrapped.base_price, dec!(1200));
        assert!(wrapped.items.is_empty());
    }
}
