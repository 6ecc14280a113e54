use selector_core::*;
use speculate2::speculate;

/// root(mandatory) → A(mandatory), B(xor) → B1, B2, C(or) → C1, C2
fn shop_tree() -> FeatureTree {
    let raw = RawNode::leaf("root", "Application", true).with_children(vec![
        RawNode::leaf("A", "Catalog", true),
        RawNode::leaf("B", "Payment-xor", false).with_children(vec![
            RawNode::leaf("B1", "Card", false),
            RawNode::leaf("B2", "Cash", false),
        ]),
        RawNode::leaf("C", "Filters-or", false).with_children(vec![
            RawNode::leaf("C1", "ByDiscount", false),
            RawNode::leaf("C2", "ByWeather", false),
        ]),
    ]);
    FeatureTree::from_raw(&raw).expect("Failed to build tree")
}

/// Deeper model with nested XOR containers and a mandatory child under an
/// optional feature.
fn nested_tree() -> FeatureTree {
    let raw = RawNode::leaf("app", "App", true).with_children(vec![
        RawNode::leaf("core", "Core", true).with_children(vec![
            RawNode::leaf("log", "Logging", false),
            RawNode::leaf("store-xor", "Storage-xor", false).with_children(vec![
                RawNode::leaf("mem", "Memory", false),
                RawNode::leaf("disk", "Disk", false).with_children(vec![
                    RawNode::leaf("fmt-xor", "Format-xor", false).with_children(vec![
                        RawNode::leaf("json", "Json", false),
                        RawNode::leaf("bin", "Binary", false),
                    ]),
                    RawNode::leaf("fsync", "Fsync", true),
                ]),
                RawNode::leaf("net", "Network", false),
            ]),
        ]),
        RawNode::leaf("ui-or", "Ui-or", false).with_children(vec![
            RawNode::leaf("cli", "Cli", false),
            RawNode::leaf("web", "Web", false).with_children(vec![
                RawNode::leaf("auth-and", "Auth-and", false).with_children(vec![
                    RawNode::leaf("login", "Login", false),
                    RawNode::leaf("logout", "Logout", false),
                ]),
            ]),
        ]),
    ]);
    FeatureTree::from_raw(&raw).expect("Failed to build tree")
}

/// Mandatory container with optional children next to an optional branch.
fn catalog_tree() -> FeatureTree {
    let raw = RawNode::leaf("root", "Application", true).with_children(vec![
        RawNode::leaf("A", "Catalog", true).with_children(vec![
            RawNode::leaf("A1", "Search", false),
            RawNode::leaf("A2", "Browse", false),
        ]),
        RawNode::leaf("B", "Payment", false).with_children(vec![
            RawNode::leaf("B1", "Card", false),
        ]),
    ]);
    FeatureTree::from_raw(&raw).expect("Failed to build tree")
}

fn run(tree: &FeatureTree, policy: SelectionPolicy, events: &[(&str, Intent)]) -> Selection {
    let propagator = Propagator::new(tree, policy);
    events.iter().fold(Selection::new(), |selection, (id, intent)| {
        propagator.apply(&selection, id, *intent)
    })
}

fn ids(selection: &Selection) -> Vec<&str> {
    selection.iter().collect()
}

fn covers_mandatory(tree: &FeatureTree, selection: &Selection) -> bool {
    selection.is_empty() || tree.mandatory_ids().all(|id| selection.contains(id))
}

fn xor_respected(tree: &FeatureTree, selection: &Selection) -> bool {
    tree.iter()
        .filter(|node| node.group_type == GroupType::Xor)
        .all(|container| {
            tree.children_of(container)
                .filter(|child| selection.contains(&child.id))
                .count()
                <= 1
        })
}

/// Small deterministic generator so event sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound
    }
}

speculate! {
    before {
        let tree = shop_tree();
        let xor_on = SelectionPolicy::with_xor(true);
        let xor_off = SelectionPolicy::default();
    }

    describe "selecting" {
        it "pulls in the container, root and mandatory features for a leaf" {
            let selection = run(&tree, xor_off, &[("B1", Intent::Select)]);
            assert_eq!(ids(&selection), vec!["A", "B", "B1", "root"]);
        }

        it "replaces an XOR sibling when enforcement is on" {
            let selection = run(&tree, xor_on, &[
                ("B1", Intent::Select),
                ("B2", Intent::Select),
            ]);
            assert_eq!(ids(&selection), vec!["A", "B", "B2", "root"]);
        }

        it "keeps both XOR siblings when enforcement is off" {
            let selection = run(&tree, xor_off, &[
                ("B1", Intent::Select),
                ("B2", Intent::Select),
            ]);
            assert!(selection.contains("B1"));
            assert!(selection.contains("B2"));
        }

        it "never blocks co-selection inside an OR group" {
            let selection = run(&tree, xor_on, &[
                ("C1", Intent::Select),
                ("C2", Intent::Select),
            ]);
            assert!(selection.contains("C"));
            assert!(selection.contains("C1"));
            assert!(selection.contains("C2"));
        }

        it "selects only the mandatory baseline for the root" {
            let selection = run(&tree, xor_off, &[("root", Intent::Select)]);
            assert_eq!(ids(&selection), vec!["A", "root"]);
        }

        it "resets to the baseline when a mandatory feature is selected from empty" {
            let selection = run(&tree, xor_off, &[("A", Intent::Select)]);
            assert_eq!(ids(&selection), vec!["A", "root"]);
        }

        it "ignores ids the tree does not contain" {
            let selection = run(&tree, xor_off, &[
                ("B1", Intent::Select),
                ("Z9", Intent::Select),
                ("Z9", Intent::Deselect),
            ]);
            assert_eq!(ids(&selection), vec!["A", "B", "B1", "root"]);
        }
    }

    describe "deselecting" {
        it "collapses everything when a mandatory feature is removed" {
            let selection = run(&tree, xor_off, &[
                ("B1", Intent::Select),
                ("A", Intent::Deselect),
            ]);
            assert!(selection.is_empty());
        }

        it "collapses everything when the root is removed" {
            let selection = run(&tree, xor_off, &[
                ("B1", Intent::Select),
                ("C2", Intent::Select),
                ("root", Intent::Deselect),
            ]);
            assert!(selection.is_empty());
        }

        it "prunes a container once its last child is gone" {
            let selection = run(&tree, xor_off, &[
                ("B1", Intent::Select),
                ("B1", Intent::Deselect),
            ]);
            assert_eq!(ids(&selection), vec!["A", "root"]);
        }

        it "collapses when the parent is mandatory even with a sibling still selected" {
            let tree = catalog_tree();
            let selection = run(&tree, xor_off, &[
                ("A1", Intent::Select),
                ("A2", Intent::Select),
                ("A1", Intent::Deselect),
            ]);
            assert!(selection.is_empty());
        }

        it "collapses when a direct child of a mandatory root is removed" {
            let tree = catalog_tree();
            let selection = run(&tree, xor_off, &[
                ("B1", Intent::Select),
                ("B", Intent::Deselect),
            ]);
            assert!(selection.is_empty());
        }

        it "keeps a container while another child stays selected" {
            let selection = run(&tree, xor_off, &[
                ("C1", Intent::Select),
                ("C2", Intent::Select),
                ("C1", Intent::Deselect),
            ]);
            assert_eq!(ids(&selection), vec!["A", "C", "C2", "root"]);
        }
    }

    describe "nested models" {
        it "adds mandatory children of the chosen feature" {
            let tree = nested_tree();
            let selection = run(&tree, xor_off, &[("disk", Intent::Select)]);
            assert_eq!(
                ids(&selection),
                vec!["app", "core", "disk", "fsync", "store-xor"]
            );
        }

        it "excludes the competing branch of an outer XOR group" {
            let tree = nested_tree();
            let selection = run(&tree, xor_on, &[
                ("json", Intent::Select),
                ("net", Intent::Select),
            ]);
            assert!(selection.contains("net"));
            assert!(!selection.contains("disk"));
            assert!(!selection.contains("json"));
            assert!(!selection.contains("fmt-xor"));
            assert!(covers_mandatory(&tree, &selection));
        }

        it "clears the selection when pruning reaches a mandatory ancestor" {
            let tree = nested_tree();
            let selection = run(&tree, xor_off, &[
                ("app", Intent::Select),
                ("log", Intent::Select),
                ("log", Intent::Deselect),
            ]);
            assert!(selection.is_empty());
        }
    }

    describe "invariants" {
        it "holds across long random event sequences" {
            for tree in [shop_tree(), nested_tree(), catalog_tree()] {
                let nodes: Vec<String> = tree.iter().map(|node| node.id.clone()).collect();
                let root = tree.root().id.clone();

                for seed in 0..25u64 {
                    let mut rng = Lcg(seed);
                    let propagator = Propagator::new(&tree, xor_on);
                    let mut selection = Selection::new();

                    for _ in 0..200 {
                        let id = &nodes[rng.next(nodes.len())];
                        let intent = if rng.next(2) == 0 { Intent::Select } else { Intent::Deselect };
                        let next = propagator.apply(&selection, id, intent);

                        assert!(covers_mandatory(&tree, &next), "mandatory baseline lost after {} {:?}", id, intent);
                        assert!(xor_respected(&tree, &next), "XOR violated after {} {:?}", id, intent);
                        assert_eq!(propagator.apply(&next, id, intent), next, "not idempotent for {} {:?}", id, intent);
                        if *id == root && intent == Intent::Deselect {
                            assert!(next.is_empty());
                        }
                        let parent_mandatory = tree
                            .get(id)
                            .and_then(|node| tree.parent_of(node))
                            .is_some_and(|parent| parent.mandatory);
                        if intent == Intent::Deselect && selection.contains(id) && parent_mandatory {
                            assert!(next.is_empty(), "deselecting {} under a mandatory parent kept {:?}", id, next);
                        }
                        selection = next;
                    }
                }
            }
        }

        it "round-trips a tree through its raw document" {
            let nested = nested_tree();
            let rebuilt = FeatureTree::from_raw(&nested.to_raw()).expect("Failed to rebuild");
            let before: Vec<_> = nested.iter().map(|n| (n.id.clone(), n.label.clone(), n.mandatory)).collect();
            let after: Vec<_> = rebuilt.iter().map(|n| (n.id.clone(), n.label.clone(), n.mandatory)).collect();
            assert_eq!(before, after);
        }
    }
}
