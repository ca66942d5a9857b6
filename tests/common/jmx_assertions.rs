use roxmltree::{Document, Node};

/// All elements named `tag`, in document order.
pub fn elements<'a, 'input>(doc: &'a Document<'input>, tag: &str) -> Vec<Node<'a, 'input>> {
    doc.descendants().filter(|n| n.has_tag_name(tag)).collect()
}

/// The element named `tag` whose `testname` is `name`.
pub fn test_element<'a, 'input>(
    doc: &'a Document<'input>,
    tag: &str,
    name: &str,
) -> Option<Node<'a, 'input>> {
    doc.descendants()
        .find(|n| n.has_tag_name(tag) && n.attribute("testname") == Some(name))
}

/// The text of a direct property child, `""` when the property is empty.
pub fn prop<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.is_element() && c.attribute("name") == Some(name))
        .map(|c| c.text().unwrap_or(""))
}

/// The `<hashTree>` holding `node`'s children.
pub fn subtree<'a, 'input>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.next_sibling_element().filter(|n| n.has_tag_name("hashTree"))
}

/// Tag names of the test elements directly inside `tree`.
pub fn child_tags<'a>(tree: Node<'a, '_>) -> Vec<&'a str> {
    tree.children()
        .filter(|n| n.is_element() && !n.has_tag_name("hashTree"))
        .map(|n| n.tag_name().name())
        .collect()
}

/// Fails unless every test element inside `tree` is immediately followed by
/// its `<hashTree>`, at every depth.
pub fn assert_paired_hash_trees(tree: Node<'_, '_>) {
    for child in tree.children().filter(|n| n.is_element()) {
        if child.has_tag_name("hashTree") {
            assert_paired_hash_trees(child);
            continue;
        }
        assert!(
            subtree(child).is_some(),
            "<{} testname={:?}> is not followed by a hashTree",
            child.tag_name().name(),
            child.attribute("testname")
        );
    }
}
