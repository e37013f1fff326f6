use super::*;

#[test]
fn strips_style_script_and_foreign_object() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><style>rect { fill: url(https://evil/x.svg#p) } a &lt; b</style><script type="text/javascript"><![CDATA[ if (a < b) {} ]]></script><foreignObject width="5" height="5"><div xmlns="http://www.w3.org/1999/xhtml"><p>hi</p></div></foreignObject><rect width="10" height="10" fill="red"/></svg>"#;
    let (out, report) = sanitize_svg(svg).unwrap();
    assert!(!out.contains("style"));
    assert!(!out.contains("script"));
    assert!(!out.contains("foreignObject"));
    assert!(!out.contains("<div"));
    assert!(out.contains(r#"<rect width="10" height="10" fill="red"/>"#));
    assert!(out.ends_with("</svg>"));
    assert_eq!(report.removed_elements, 3);
}

#[test]
fn keeps_namespace_declarations_but_drops_remote_refs() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink"><image xlink:href="https://cdn.example.com/a.png" width="4" height="4"/><use href='#local'/><rect fill="url(HTTP://x/y#g)" width="1" height="1"/></svg>"#;
    let (out, report) = sanitize_svg(svg).unwrap();
    assert!(out.contains(r#"xmlns="http://www.w3.org/2000/svg""#));
    assert!(out.contains(r#"xmlns:xlink="http://www.w3.org/1999/xlink""#));
    assert!(!out.contains("cdn.example.com"));
    assert!(!out.to_ascii_lowercase().contains("http://x/"));
    assert!(out.contains(r#"<image width="4" height="4"/>"#));
    assert!(out.contains("<use href='#local'/>"));
    assert_eq!(report.removed_attributes, 2);
}

#[test]
fn entity_encoded_remote_reference_is_dropped() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><image href="&#104;ttps://evil.example/x.png" width="4" height="4"/></svg>"#;
    let (out, report) = sanitize_svg(svg).unwrap();
    assert_eq!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg"><image width="4" height="4"/></svg>"#
    );
    assert_eq!(report.removed_attributes, 1);
}

#[test]
fn dtd_entity_remote_reference_is_dropped() {
    let svg = r#"<!DOCTYPE svg [<!ENTITY e "https://evil.example/x.png">]><svg xmlns="http://www.w3.org/2000/svg"><image href="&e;" width="4" height="4"/></svg>"#;
    let (out, report) = sanitize_svg(svg).unwrap();
    assert!(!out.contains("href"));
    assert!(out.contains(r#"<image width="4" height="4"/>"#));
    assert_eq!(report.removed_attributes, 1);
}

#[test]
fn nested_foreign_object_content_is_removed() {
    let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><g><foreignObject><div><div><span/></div></div></foreignObject><circle r="2"/></g></svg>"#;
    let (out, report) = sanitize_svg(svg).unwrap();
    assert_eq!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg"><g><circle r="2"/></g></svg>"#
    );
    assert_eq!(report.removed_elements, 1);
}

#[test]
fn self_closing_blocked_element_is_removed_alone() {
    let svg = "<svg><style/><rect/></svg>";
    assert_eq!(sanitize(svg).unwrap(), "<svg><rect/></svg>");
}

#[test]
fn clean_input_passes_through_unchanged() {
    let svg = "<?xml version=\"1.0\"?><!DOCTYPE svg><!-- <style> --><svg><rect/></svg>";
    let (out, report) = sanitize_svg(svg).unwrap();
    assert_eq!(out, svg);
    assert_eq!(report, SanitizeReport::default());
}

#[test]
fn namespaced_style_is_removed() {
    let svg = r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:style>*{}</svg:style><svg:rect/></svg:svg>"#;
    assert_eq!(
        sanitize(svg).unwrap(),
        r#"<svg:svg xmlns:svg="http://www.w3.org/2000/svg"><svg:rect/></svg:svg>"#
    );
}

#[test]
fn malformed_svg_is_rejected() {
    let err = sanitize_svg("<svg><rect width=\"1").unwrap_err();
    assert!(matches!(err, FxError::Validation(_)));
}
