//! End-to-end tests for the splicing operations.
//!
//! Messages go in as raw bytes and come out as raw bytes, the way the
//! filter sees them.

#![allow(clippy::unwrap_used)]

use mailsplice_core::mailsplice_mime::{HeaderMerge, MimeNode, parse};
use mailsplice_core::{
    Config, Error, Mode, SpliceOptions, StructuralError, Target, process, process_with,
};

const RELATED: &str = concat!(
    "From: alice@example.com\r\n",
    "Subject: newsletter\r\n",
    "MIME-Version: 1.0\r\n",
    "Content-Type: multipart/related; type=\"multipart/alternative\";\r\n",
    " boundary=\"rel\"\r\n",
    "\r\n",
    "This is a multi-part message in MIME format.\r\n",
    "--rel\r\n",
    "Content-Type: multipart/alternative; boundary=alt\r\n",
    "\r\n",
    "--alt\r\n",
    "Content-Type: text/plain; charset=us-ascii\r\n",
    "\r\n",
    "A\r\n",
    "--alt\r\n",
    "Content-Type: text/html; charset=iso-8859-1\r\n",
    "Content-Transfer-Encoding: quoted-printable\r\n",
    "\r\n",
    "<b>A</b>\r\n",
    "--alt--\r\n",
    "\r\n",
    "--rel\r\n",
    "Content-Type: image/png\r\n",
    "Content-ID: <logo>\r\n",
    "Content-Transfer-Encoding: base64\r\n",
    "\r\n",
    "iVBORw0K\r\n",
    "--rel--\r\n",
);

fn config(mode: Mode) -> Config {
    Config::new(mode)
}

fn with_options(mode: Mode, options: SpliceOptions) -> Config {
    Config { mode, options }
}

fn alternatives(root: &MimeNode) -> usize {
    root.count(|node| node.matches_type("multipart/alternative"))
}

#[test]
fn test_related_alternative_resolves_to_html() {
    let out = process(RELATED.as_bytes(), &config(Mode::Alternative(Target::Html))).unwrap();
    let root = parse(&out).unwrap();

    assert!(root.walk().all(|node| node.defects.is_empty()));
    assert_eq!(alternatives(&root), 0);
    assert_eq!(root.content_type().param("type"), Some("text/html"));
    assert_eq!(root.content_type().boundary(), Some("rel"));
    assert_eq!(root.headers.get("subject"), Some("newsletter"));

    let children = root.children().unwrap();
    assert_eq!(children.len(), 2);
    let html = &children[0];
    assert!(html.matches_type("text/html"));
    assert_eq!(html.content_type().charset(), Some("utf-8"));
    assert_eq!(html.body_text().unwrap(), "<b>A</b>");
    assert_eq!(children[1].headers.get("content-id"), Some("<logo>"));
}

#[test]
fn test_related_alternative_resolves_to_plain() {
    let out = process(RELATED.as_bytes(), &config(Mode::Alternative(Target::Plain))).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("type=\"text/plain\""));
    assert!(text.contains("--rel\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nA\r\n--rel\r\n"));
    assert!(text.starts_with("From: alice@example.com\r\nSubject: newsletter\r\n"));
    assert!(text.contains("This is a multi-part message in MIME format.\r\n--rel\r\n"));
}

#[test]
fn test_missing_target_fails_without_output() {
    let input = concat!(
        "Content-Type: multipart/alternative; boundary=a\r\n",
        "\r\n",
        "--a\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "only plain\r\n",
        "--a--\r\n",
    );
    let result = process(input.as_bytes(), &config(Mode::Alternative(Target::Html)));
    assert!(matches!(
        result,
        Err(Error::Structural(StructuralError::TargetAbsent(target))) if target == "text/html"
    ));
}

#[test]
fn test_message_without_alternative_fails() {
    let input = concat!(
        "Content-Type: multipart/mixed; boundary=m\r\n",
        "\r\n",
        "--m\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "x\r\n",
        "--m--\r\n",
    );
    for target in [Target::Plain, Target::Html, Target::Calendar] {
        let result = process(input.as_bytes(), &config(Mode::Alternative(target)));
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::NoAlternativePart))
        ));
    }
}

#[test]
fn test_single_part_message_is_not_multipart() {
    let result = process(
        b"Content-Type: text/plain\r\n\r\nhello\r\n",
        &config(Mode::Alternative(Target::Plain)),
    );
    assert!(matches!(
        result,
        Err(Error::Structural(StructuralError::NotMultipart))
    ));
}

#[test]
fn test_rerun_finds_no_alternative() {
    let once = process(RELATED.as_bytes(), &config(Mode::Alternative(Target::Html))).unwrap();
    let again = process(&once, &config(Mode::Alternative(Target::Html)));
    assert!(matches!(
        again,
        Err(Error::Structural(StructuralError::NoAlternativePart))
    ));
}

#[test]
fn test_first_of_duplicate_representations_wins() {
    let input = concat!(
        "Content-Type: multipart/alternative; boundary=a\r\n",
        "\r\n",
        "--a\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>A</p>\r\n",
        "--a\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<p>B</p>\r\n",
        "--a--\r\n",
    );
    let out = process(input.as_bytes(), &config(Mode::Alternative(Target::Html))).unwrap();
    assert_eq!(
        out,
        b"Content-Type: text/html; charset=utf-8\r\n\r\n<p>A</p>".as_slice()
    );
}

#[test]
fn test_index_mode_bounds() {
    for (index, expected) in [(0, "image/png"), (1, "text/plain"), (2, "text/html")] {
        let input = concat!(
            "Content-Type: multipart/mixed; boundary=m\r\n",
            "\r\n",
            "--m\r\n",
            "Content-Type: image/png\r\n",
            "\r\n",
            "png\r\n",
            "--m\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain\r\n",
            "--m\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "html\r\n",
            "--m--\r\n",
        );
        let out = process(input.as_bytes(), &config(Mode::PartIndex(index))).unwrap();
        assert!(parse(&out).unwrap().matches_type(expected));

        let result = process(input.as_bytes(), &config(Mode::PartIndex(index + 3)));
        assert!(matches!(
            result,
            Err(Error::Structural(StructuralError::IndexOutOfRange { len: 3, .. }))
        ));
    }
}

#[test]
fn test_any2plain_searches_nested_parts() {
    let out = process(RELATED.as_bytes(), &config(Mode::AnyBody(Target::Plain))).unwrap();
    assert_eq!(
        out,
        concat!(
            "From: alice@example.com\r\n",
            "Subject: newsletter\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "A",
        )
        .as_bytes()
    );
}

#[test]
fn test_html2alternative_then_alternative2html() {
    let input = concat!(
        "Subject: html only\r\n",
        "Content-Type: text/html; charset=utf-8\r\n",
        "Content-Transfer-Encoding: 8bit\r\n",
        "\r\n",
        "<p>caf\u{e9}</p>\r\n",
    );
    let strip = |html: &str| html.replace("<p>", "").replace("</p>", "");

    let inserted =
        process_with(input.as_bytes(), &config(Mode::InsertAlternative), &strip).unwrap();
    let root = parse(&inserted).unwrap();
    assert!(root.matches_type("multipart/alternative"));
    assert_eq!(root.children().unwrap()[1].body_text().unwrap(), "caf\u{e9}\r\n");

    let resolved = process(&inserted, &config(Mode::Alternative(Target::Html))).unwrap();
    assert_eq!(
        resolved,
        concat!(
            "Subject: html only\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "Content-Transfer-Encoding: 8bit\r\n",
            "\r\n",
            "<p>caf\u{e9}</p>\r\n",
        )
        .as_bytes()
    );
}

#[test]
fn test_to7or8bit_leaves_no_encoded_text() {
    let out = process(RELATED.as_bytes(), &config(Mode::To7or8bit)).unwrap();
    let root = parse(&out).unwrap();

    for node in root.walk().filter(|node| node.content_type().is_text()) {
        assert!(!node.headers.get("content-transfer-encoding").is_some_and(
            |cte| cte.eq_ignore_ascii_case("quoted-printable") || cte.eq_ignore_ascii_case("base64")
        ));
    }
    let png = root.walk().find(|node| node.matches_type("image/png")).unwrap();
    assert_eq!(png.headers.get("content-transfer-encoding"), Some("base64"));
}

#[test]
fn test_utf8_relabels_text_parts() {
    let out = process(RELATED.as_bytes(), &config(Mode::Utf8)).unwrap();
    let root = parse(&out).unwrap();
    let charsets: Vec<Option<String>> = root
        .walk()
        .filter(|node| node.content_type().is_text())
        .map(|node| node.content_type().charset().map(str::to_string))
        .collect();
    assert_eq!(charsets, [Some("utf-8".to_string()), Some("utf-8".to_string())]);
}

#[test]
fn test_header_merge_policies_differ_in_position() {
    let input = concat!(
        "Content-Type: multipart/mixed; boundary=m\r\n",
        "X-Mailer: outer\r\n",
        "Subject: merge\r\n",
        "\r\n",
        "--m\r\n",
        "X-Mailer: inner\r\n",
        "Content-Type: application/pdf\r\n",
        "\r\n",
        "%PDF\r\n",
        "--m--\r\n",
    );

    let overwrite = process(input.as_bytes(), &config(Mode::PartIndex(0))).unwrap();
    assert_eq!(
        overwrite,
        concat!(
            "X-Mailer: inner\r\n",
            "Subject: merge\r\n",
            "Content-Type: application/pdf\r\n",
            "\r\n",
            "%PDF",
        )
        .as_bytes()
    );

    let append = process(
        input.as_bytes(),
        &with_options(
            Mode::PartIndex(0),
            SpliceOptions {
                header_merge: HeaderMerge::DeleteAndAppend,
                strict: false,
            },
        ),
    )
    .unwrap();
    assert_eq!(
        append,
        concat!(
            "Subject: merge\r\n",
            "X-Mailer: inner\r\n",
            "Content-Type: application/pdf\r\n",
            "\r\n",
            "%PDF",
        )
        .as_bytes()
    );
}

#[test]
fn test_strict_mode_on_nested_alternatives() {
    let input = concat!(
        "Content-Type: multipart/alternative; boundary=outer\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "A\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "B\r\n",
        "--inner--\r\n",
        "--outer--\r\n",
    );
    let strict = SpliceOptions {
        strict: true,
        ..SpliceOptions::default()
    };

    let out = process(input.as_bytes(), &config(Mode::Alternative(Target::Plain))).unwrap();
    assert!(out.ends_with(b"\r\n\r\nA"));

    let result = process(
        input.as_bytes(),
        &with_options(Mode::Alternative(Target::Plain), strict),
    );
    assert!(matches!(
        result,
        Err(Error::Structural(StructuralError::AmbiguousAlternative(2)))
    ));
}

#[test]
fn test_defective_message_is_rejected() {
    let input = concat!(
        "Content-Type: multipart/alternative; boundary=a\r\n",
        "\r\n",
        "--a\r\n",
        "Content-Type: text/plain\r\n",
        "\r\n",
        "never closed\r\n",
    );
    let result = process(input.as_bytes(), &config(Mode::Alternative(Target::Plain)));
    assert!(matches!(result, Err(Error::Validation { .. })));
}

#[test]
fn test_unknown_charset_is_relabelled_utf8() {
    let input = b"Content-Type: multipart/alternative; boundary=a\r\n\
        \r\n\
        --a\r\n\
        Content-Type: text/plain; charset=unknown-8bit\r\n\
        \r\n\
        caf\xe9\r\n\
        --a\r\n\
        Content-Type: text/html\r\n\
        \r\n\
        <p>x</p>\r\n\
        --a--\r\n";

    let out = process(input, &config(Mode::Alternative(Target::Plain))).unwrap();
    assert_eq!(
        out,
        b"Content-Type: text/plain; charset=utf-8\r\n\r\ncaf\xe9".as_slice()
    );
}

#[test]
fn test_raw_8bit_headers_pass_through() {
    let input = b"Subject: caf\xe9\r\n\
        Content-Type: multipart/mixed; boundary=m\r\n\
        \r\n\
        --m\r\n\
        Content-Type: text/plain\r\n\
        \r\n\
        hi\r\n\
        --m--\r\n";

    let out = process(input, &config(Mode::PartIndex(0))).unwrap();
    assert_eq!(
        out,
        b"Subject: caf\xe9\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nhi".as_slice()
    );
}
