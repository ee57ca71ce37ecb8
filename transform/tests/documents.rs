use manpo_core::{ExtractionCatalog, TranslatingCatalog};
use manpo_transform::{
    GENERATED_DOCUMENT_EXIT_CODE, GroffCodePolicy, TransformOptions, transform_text,
};

fn extract(document: &str) -> ExtractionCatalog {
    extract_with(document, TransformOptions::default())
}

fn extract_with(document: &str, options: TransformOptions) -> ExtractionCatalog {
    let mut catalog = ExtractionCatalog::new();
    transform_text("test.1", document, &mut catalog, options).expect("document should transform");
    catalog
}

fn msgids(catalog: &ExtractionCatalog) -> Vec<String> {
    catalog
        .entries()
        .iter()
        .map(|entry| entry.msgid.clone())
        .collect()
}

fn translate(document: &str, pairs: &[(&str, &str)]) -> String {
    let mut catalog = TranslatingCatalog::new();
    for (msgid, msgstr) in pairs {
        catalog.insert(msgid, msgstr);
    }
    transform_text("test.1", document, &mut catalog, TransformOptions::default())
        .expect("document should transform");
    catalog.output().to_string()
}

#[test]
fn test_bold_macro_presents_font_span() {
    let catalog = extract(".B hello world\n");
    assert_eq!(msgids(&catalog), vec!["B<hello world>"]);
    assert_eq!(catalog.output(), "\\fBhello world\\fR\n");
}

#[test]
fn test_bold_macro_reinjects_translation() {
    let output = translate(".B hello world\n", &[("B<hello world>", "B<bonjour monde>")]);
    assert_eq!(output, "\\fBbonjour monde\\fR\n");
}

#[test]
fn test_alternating_macro_presents_flat_spans() {
    let catalog = extract(".BI foo bar baz\n");
    assert_eq!(msgids(&catalog), vec!["B<foo>I<bar>B<baz>"]);
    assert_eq!(catalog.output(), "\\fBfoo\\fIbar\\fBbaz\\fR\n");
}

#[test]
fn test_tagged_paragraph_translates_tag_without_wrap() {
    let catalog = extract(".TP\n.B \\-f\nforce the operation\n");
    assert_eq!(msgids(&catalog), vec!["B<-f>", "force the operation"]);
    assert_eq!(
        catalog.output(),
        ".TP\n\\fB\\-f\\fR\nforce the operation\n"
    );

    let tag = &catalog.entries()[0];
    assert!(!tag.wrap);
    assert_eq!(tag.kind, "TP");
}

#[test]
fn test_tagged_paragraph_passes_pd_through() {
    let catalog = extract(".TP\n.PD 0\n.B \\-q\nquiet mode\n");
    assert_eq!(
        catalog.output(),
        ".TP\n.PD 0\n\\fB\\-q\\fR\nquiet mode\n"
    );
}

#[test]
fn test_no_wrap_region_round_trips_verbatim() {
    let document = ".nf\n  column one\n      indented\n.fi\nafter text\n";
    let catalog = extract(document);
    assert_eq!(catalog.output(), document);

    let block = catalog
        .entries()
        .iter()
        .find(|entry| entry.msgid.contains("column one"))
        .expect("block entry");
    assert!(!block.wrap);
}

#[test]
fn test_leading_whitespace_suppresses_wrap_for_one_paragraph() {
    let document = "  indented line\n\nnormal paragraph\n";
    let catalog = extract(document);
    assert_eq!(catalog.output(), document);

    assert!(!catalog.entries()[0].wrap);
    assert!(catalog.entries()[1].wrap);
}

#[test]
fn test_file_inclusion_is_rejected() {
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        ".so man1/other.1\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("inclusion must fail");
    assert!(err.to_string().contains("so"));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_generated_document_uses_distinct_exit_code() {
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        ".\\\" Automatically generated by Pod::Man\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("generated input must be rejected");
    assert_eq!(err.exit_code(), GENERATED_DOCUMENT_EXIT_CODE);
    assert!(err.to_string().contains("Pod::Man"));
}

#[test]
fn test_header_banner_precedes_th_exactly_once() {
    let catalog = extract(".TH LS 1 \"March 2024\" GNU \"User Commands\"\n");
    let output = catalog.output();

    assert!(output.starts_with(".\\\"***"));
    assert!(output.contains(".TH LS 1 \"March 2024\" GNU \"User Commands\"\n"));
    assert_eq!(output.matches("generated by manpo").count(), 1);

    let ids = msgids(&catalog);
    assert!(ids.contains(&"LS".to_string()));
    assert!(ids.contains(&"March 2024".to_string()));
    assert!(!ids.contains(&"1".to_string()), "section stays untranslated");
}

#[test]
fn test_section_heading_argument_on_next_line() {
    let catalog = extract(".SH\nNAME\n");
    assert_eq!(msgids(&catalog), vec!["NAME"]);
    assert_eq!(catalog.output(), ".SH NAME\n");
}

#[test]
fn test_heading_with_roman_span_marks_it() {
    let catalog = extract(".SH NAME \\fRquiet\\fP\n");
    assert_eq!(msgids(&catalog), vec!["NAME R<quiet>"]);
}

#[test]
fn test_comment_attachment_and_uniqueness() {
    let document = "\
.\\\" intro comment
First paragraph.

Second paragraph.
.\\\" trailing comment
";
    let catalog = extract(document);
    assert_eq!(catalog.output(), document);

    let first = &catalog.entries()[0];
    assert_eq!(first.msgid, "First paragraph.");
    assert_eq!(first.comments, vec![" intro comment".to_string()]);
}

#[test]
fn test_comment_on_text_line_attaches_to_current_paragraph() {
    let catalog = extract("Text line \\\" note\n");
    assert_eq!(catalog.output(), ".\\\" note\nText line\n");
    assert_eq!(catalog.entries()[0].comments, vec![" note".to_string()]);
}

#[test]
fn test_comments_from_adjacent_lines_keep_source_order() {
    let catalog = extract(".\\\" first remark\nsome text \\\" second remark\n");
    assert_eq!(
        catalog.output(),
        ".\\\" first remark\n.\\\" second remark\nsome text\n"
    );
    assert_eq!(
        catalog.entries()[0].comments,
        vec![" first remark\n second remark".to_string()]
    );
}

#[test]
fn test_definition_block_fails_by_default() {
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        ".de XX\nbody\n..\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("definitions are rejected under the fail policy");
    assert!(err.to_string().contains("de"));
}

#[test]
fn test_definition_block_verbatim_policy() {
    let document = ".de XX\nsome body\n..\n";
    let options = TransformOptions {
        groff_code: GroffCodePolicy::Verbatim,
        ..TransformOptions::default()
    };
    let catalog = extract_with(document, options);
    assert_eq!(catalog.output(), document);
    assert!(catalog.entries().is_empty());
}

#[test]
fn test_definition_block_translate_policy() {
    let document = ".de XX\nsome body\n..\n";
    let options = TransformOptions {
        groff_code: GroffCodePolicy::Translate,
        ..TransformOptions::default()
    };
    let catalog = extract_with(document, options);
    assert_eq!(catalog.output(), document);

    let entry = &catalog.entries()[0];
    assert_eq!(entry.msgid, ".de XX\nsome body\n..");
    assert_eq!(entry.kind, "groff code");
    assert!(!entry.wrap);
}

#[test]
fn test_conditional_single_line_verbatim() {
    let options = TransformOptions {
        groff_code: GroffCodePolicy::Verbatim,
        ..TransformOptions::default()
    };
    let catalog = extract_with(".if n .br\ntext after\n", options);
    assert_eq!(catalog.output(), ".if n .br\ntext after\n");
}

#[test]
fn test_conditional_with_braces_consumes_else_branch() {
    let document = ".ie n \\{\\\nnroff branch\n.\\}\n.el troff branch\n";
    let options = TransformOptions {
        groff_code: GroffCodePolicy::Verbatim,
        ..TransformOptions::default()
    };
    let catalog = extract_with(document, options);
    assert_eq!(catalog.output(), document);
}

#[test]
fn test_ie_without_el_is_rejected() {
    let options = TransformOptions {
        groff_code: GroffCodePolicy::Verbatim,
        ..TransformOptions::default()
    };
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        ".ie n one\nplain line\n",
        &mut catalog,
        options,
    )
    .expect_err("'.ie' needs its '.el'");
    assert!(err.to_string().contains(".el"));
}

#[test]
fn test_string_define_kind_carries_the_name() {
    let catalog = extract(".ds Ver version 1.2\n");
    assert_eq!(catalog.output(), ".ds Ver version 1.2\n");

    let entry = &catalog.entries()[0];
    assert_eq!(entry.msgid, "version 1.2");
    assert_eq!(entry.kind, "ds Ver");
}

#[test]
fn test_table_cells_translate_independently() {
    let document = ".TS\nl l.\nalpha\tbeta\n.TE\n";
    let catalog = extract(document);
    assert_eq!(catalog.output(), document);

    let ids = msgids(&catalog);
    assert_eq!(ids, vec!["alpha", "beta"]);
    assert!(catalog.entries().iter().all(|e| e.kind == "tbl table"));
}

#[test]
fn test_table_rows_canonicalize_escapes_and_split_comments() {
    let document = ".TS\nl l.\na\\\\b\tsecond \\\" cell note\n.TE\n";
    let catalog = extract(document);

    assert_eq!(msgids(&catalog), vec!["a\\eb", "second"]);
    assert_eq!(
        catalog.output(),
        ".TS\nl l.\na\\eb\tsecond\n.TE\n.\\\" cell note\n"
    );
}

#[test]
fn test_ignore_block_passes_through_untranslated() {
    let document = ".ig\nnothing to see\n..\nafter\n";
    let catalog = extract(document);
    assert_eq!(catalog.output(), document);
    assert_eq!(msgids(&catalog), vec!["after"]);
}

#[test]
fn test_uri_placeholder_stays_untranslated() {
    let catalog = extract(".UR :\nlink text\n.UE\n");
    assert_eq!(catalog.output(), ".UR :\nlink text\n.UE\n");
    assert_eq!(msgids(&catalog), vec!["link text"]);
}

#[test]
fn test_uri_argument_is_translated() {
    let catalog = extract(".UR https://example.com\n");
    assert_eq!(msgids(&catalog), vec!["https://example.com"]);
}

#[test]
fn test_unknown_macro_is_fatal() {
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        ".XYZZY arg\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("unknown macros abort");
    assert!(err.to_string().contains("XYZZY"));
}

#[test]
fn test_custom_no_wrap_pair() {
    let document = ".Vb\n  verbatim text\n.Ve\n";
    let options = TransformOptions {
        no_wrap: vec!["Vb:Ve".to_string()],
        ..TransformOptions::default()
    };
    let catalog = extract_with(document, options);
    assert_eq!(catalog.output(), document);

    let block = &catalog.entries()[0];
    assert_eq!(block.msgid, "  verbatim text");
    assert!(!block.wrap);
}

#[test]
fn test_inline_option_embeds_macro_in_paragraph() {
    let options = TransformOptions {
        inline: vec!["XX".to_string()],
        ..TransformOptions::default()
    };
    let catalog = extract_with("See\n.XX arg\nhere.\n", options);
    assert_eq!(msgids(&catalog), vec!["See\nE<.XX arg>\nhere."]);
    assert_eq!(catalog.output(), "See\n.XX arg\nhere.\n");
}

#[test]
fn test_translate_each_can_keep_the_tag_argument() {
    let options = TransformOptions {
        translate_each: vec!["keepfirst:Ex".to_string()],
        ..TransformOptions::default()
    };
    let catalog = extract_with(".Ex tag value\n", options);
    assert_eq!(msgids(&catalog), vec!["value"]);
    assert_eq!(catalog.output(), ".Ex tag value\n");
}

#[test]
fn test_mdoc_document_flow() {
    let document = "\
.Dd March 2024
.Sh DESCRIPTION
Use the
.Fl v
flag.
";
    let catalog = extract(document);
    let ids = msgids(&catalog);
    assert!(ids.contains(&"March 2024".to_string()));
    assert!(ids.contains(&"DESCRIPTION".to_string()));
    assert!(ids.contains(&"Use the\nE<.Fl v>\nflag.".to_string()));

    let output = catalog.output();
    assert!(output.contains(".Dd March 2024\n"));
    assert!(output.contains(".Sh DESCRIPTION\n"));
    assert!(output.contains("Use the\n.Fl v\nflag.\n"));
}

#[test]
fn test_mdoc_trailing_punctuation_migrates_and_returns() {
    let document = ".Dd March 2024\nsee\n.Xr ls 1 .\nnext sentence\n";
    let catalog = extract(document);
    assert!(
        msgids(&catalog)
            .iter()
            .any(|id| id.contains("E<.Xr ls 1>."))
    );
    assert!(catalog.output().contains("\n.Xr ls 1 .\n"));
}

#[test]
fn test_angle_brackets_round_trip() {
    let catalog = extract("a < b > c\n");
    assert_eq!(msgids(&catalog), vec!["a E<lt> b E<gt> c"]);
    assert_eq!(catalog.output(), "a < b > c\n");
}

#[test]
fn test_quote_glyphs_round_trip() {
    let catalog = extract("\\*(lqquoted\\*(rq\n");
    assert_eq!(msgids(&catalog), vec!["``quoted''"]);
    assert_eq!(catalog.output(), "\\*(lqquoted\\*(rq\n");
}

#[test]
fn test_fonts_and_hyphens_round_trip() {
    let document = ".TH TEST 1\n.SH NAME\ntest \\- check \\fBbold\\fR and \\fIitalic\\fR text\n";
    let catalog = extract(document);
    assert!(
        msgids(&catalog).contains(&"test - check B<bold> and I<italic> text".to_string())
    );
    assert!(
        catalog
            .output()
            .ends_with("test \\- check \\fBbold\\fR and \\fIitalic\\fR text\n")
    );
}

#[test]
fn test_translation_starting_with_dot_is_guarded() {
    let output = translate("plain text\n", &[("plain text", ".start with dot")]);
    assert_eq!(output, "\\&.start with dot\n");
}

#[test]
fn test_unbalanced_markup_in_translation_fails() {
    let mut catalog = TranslatingCatalog::new();
    catalog.insert("B<hello world>", "B<broken");
    let err = transform_text(
        "test.1",
        ".B hello world\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("unbalanced markup must fail");
    assert!(err.to_string().contains('<'));
}

#[test]
fn test_line_continuation_escape_is_rejected() {
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        "broken \\c\ncontinuation\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("\\c is unsupported");
    assert!(err.to_string().contains("\\c"));
}

#[test]
fn test_counted_requests_with_positive_count_fail() {
    let mut catalog = ExtractionCatalog::new();
    let err = transform_text(
        "test.1",
        ".ce 2\ncentered\n",
        &mut catalog,
        TransformOptions::default(),
    )
    .expect_err("positive counts are unsupported");
    assert!(err.to_string().contains("ce"));

    let catalog = extract(".ce 0\ntext\n");
    assert_eq!(catalog.output(), ".ce 0\ntext\n");
}

#[test]
fn test_font_request_folds_into_following_paragraph() {
    let catalog = extract(".ft B\nbold paragraph\n");
    assert_eq!(msgids(&catalog), vec!["B<bold paragraph>"]);
    assert_eq!(catalog.output(), "\\fBbold paragraph\\fR\n");
}

#[test]
fn test_blank_lines_separate_paragraphs() {
    let document = "first one\n\nsecond one\n";
    let catalog = extract(document);
    assert_eq!(msgids(&catalog), vec!["first one", "second one"]);
    assert_eq!(catalog.output(), document);
}
