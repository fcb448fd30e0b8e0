//! Positional structural paths for tag-tree elements.

use scraper::ElementRef;

/// Compute the absolute, slash-separated structural path of an element,
/// root-first, as `tag[index]` segments.
///
/// The index is the 1-based ordinal of the element among same-tag-name
/// siblings under its immediate parent (siblings compared by tag name only).
/// If an ancestor does not actually contain the current element among its
/// same-tag children (tree-mutation artifact in the upstream parser), the
/// path is truncated at that point instead of failing.
///
/// Produced for traceability only; never used as a node key and not
/// guaranteed globally unique.
pub fn resolve_path(element: ElementRef<'_>) -> String {
    let mut segments: Vec<String> = Vec::new();
    let mut current = element;

    loop {
        let tag = current.value().name();
        match current.parent().and_then(ElementRef::wrap) {
            None => {
                // Traversal root: no siblings to rank against
                segments.push(format!("{}[1]", tag));
                break;
            }
            Some(parent) => {
                let mut ordinal = 0usize;
                let mut found = false;
                for sibling in parent.children().filter_map(ElementRef::wrap) {
                    if sibling.value().name() == tag {
                        ordinal += 1;
                        if sibling.id() == current.id() {
                            found = true;
                            break;
                        }
                    }
                }
                if !found {
                    break;
                }
                segments.push(format!("{}[{}]", tag, ordinal));
                current = parent;
            }
        }
    }

    segments.reverse();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector).next().unwrap()
    }

    #[test]
    fn test_path_of_nested_element() {
        let doc = Html::parse_document(
            "<html><body><div><p>one</p><p>two</p></div></body></html>",
        );
        let p = first(&doc, "p");
        assert_eq!(resolve_path(p), "/html[1]/body[1]/div[1]/p[1]");
    }

    #[test]
    fn test_sibling_ordinals_are_one_based_and_per_tag() {
        let doc = Html::parse_document(
            "<html><body><span>x</span><p>one</p><p>two</p></body></html>",
        );
        let selector = Selector::parse("p").unwrap();
        let paths: Vec<String> = doc.select(&selector).map(resolve_path).collect();
        // The span does not shift the p ordinals; only same-tag siblings count
        assert_eq!(
            paths,
            vec![
                "/html[1]/body[1]/p[1]".to_string(),
                "/html[1]/body[1]/p[2]".to_string()
            ]
        );
    }

    #[test]
    fn test_root_element_path() {
        let doc = Html::parse_document("<html><body></body></html>");
        assert_eq!(resolve_path(doc.root_element()), "/html[1]");
    }
}
