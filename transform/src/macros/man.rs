//! The man(7) and groff dispatch table with its structural handlers.

use manpo_core::TranslateOptions;
use tracing::warn;

use crate::Transformer;
use crate::args::split_args;
use crate::error::{Result, TransformError};
use crate::macros::{MacroCall, MacroHandler, MacroTable, apply_option_lists};
use crate::options::{GroffCodePolicy, TransformOptions};

/// Layout and spacing requests reproduced verbatim.
const UNTRANSLATED: &[&str] = &[
    "AT", "DT", "HP", "PD", "RE", "RS", "UC", "ad", "bp", "br", "fam", "hw", "hy", "in", "ll",
    "na", "ne", "nh", "nr", "ns", "pl", "po", "ps", "rm", "rr", "rs", "sp", "ti", "tm", "vs",
];

/// The eight font macros expanded into inline escapes.
const FONT_MACROS: &[&str] = &["B", "I", "BI", "BR", "IB", "IR", "RB", "RI"];

/// Builds the default dispatch table for man(7) documents.
pub(crate) fn build_table(options: &TransformOptions) -> MacroTable {
    let mut table = MacroTable::new();
    insert_groff_requests(&mut table);

    for name in UNTRANSLATED {
        table.insert(name.to_string(), MacroHandler::Untranslated);
    }
    for name in ["LP", "P", "PP"] {
        table.insert(name.to_string(), MacroHandler::Structural(handle_paragraph_break));
    }
    for name in FONT_MACROS {
        table.insert(name.to_string(), MacroHandler::Font);
    }
    for name in ["SM", "SB", "UN"] {
        table.insert(name.to_string(), MacroHandler::TranslateJoined);
    }
    table.insert("UE".to_string(), MacroHandler::NoArg);

    table.insert("TH".to_string(), MacroHandler::Structural(handle_th));
    table.insert("SH".to_string(), MacroHandler::Structural(handle_section));
    table.insert("SS".to_string(), MacroHandler::Structural(handle_section));
    table.insert("TP".to_string(), MacroHandler::Structural(handle_tagged_paragraph));
    table.insert("IP".to_string(), MacroHandler::Structural(handle_indented_paragraph));
    table.insert("UR".to_string(), MacroHandler::Structural(handle_uri_start));
    table.insert("TS".to_string(), MacroHandler::Structural(handle_table));
    table.insert("Dd".to_string(), MacroHandler::Structural(super::mdoc::handle_document_date));

    apply_option_lists(&mut table, options);
    table
}

/// Requests shared between the man and mdoc tables.
pub(crate) fn insert_groff_requests(table: &mut MacroTable) {
    table.insert("de".to_string(), MacroHandler::Structural(handle_definition));
    table.insert("ie".to_string(), MacroHandler::Structural(handle_conditional));
    table.insert("if".to_string(), MacroHandler::Structural(handle_conditional));
    table.insert("el".to_string(), MacroHandler::Structural(handle_stray_else));
    table.insert("ds".to_string(), MacroHandler::Structural(handle_string_define));
    table.insert("ig".to_string(), MacroHandler::Structural(handle_ignore_block));
    table.insert("ta".to_string(), MacroHandler::Structural(handle_tab_stops));
    table.insert("ft".to_string(), MacroHandler::Structural(handle_font_request));
    table.insert("so".to_string(), MacroHandler::Structural(handle_inclusion));
    table.insert("mso".to_string(), MacroHandler::Structural(handle_inclusion));
    table.insert("ce".to_string(), MacroHandler::Structural(handle_counted_request));
    table.insert("ul".to_string(), MacroHandler::Structural(handle_counted_request));
    table.insert("cu".to_string(), MacroHandler::Structural(handle_counted_request));
    table.insert("ec".to_string(), MacroHandler::Structural(handle_escape_char));
}

/// Expands a font macro into inline escapes.
///
/// `.B`/`.I` wrap the joined arguments; the two letters of an alternating
/// macro name the fonts of odd and even arguments, concatenated without
/// interior space. An alternating macro without arguments still emits its
/// trailing alternate font.
pub(crate) fn font_macro_text(
    name: &str,
    args: &[String],
    reference: &manpo_core::SourceRef,
) -> Result<String> {
    let letters: Vec<char> = name.chars().collect();
    if letters.len() == 1 {
        if args.is_empty() {
            return Err(TransformError::MalformedInput {
                reference: reference.clone(),
                message: format!("font macro '.{name}' without an argument"),
            });
        }
        return Ok(format!("\\f{}{}\\fR", letters[0], args.join(" ")));
    }

    if args.is_empty() {
        return Ok(format!("\\f{}\\fR", letters[1]));
    }
    let mut text = String::new();
    for (index, arg) in args.iter().enumerate() {
        text.push_str("\\f");
        text.push(letters[index % 2]);
        text.push_str(arg);
    }
    text.push_str("\\fR");
    Ok(text)
}

/// `.LP`/`.P`/`.PP` — paragraph breaks drop back to the regular font.
fn handle_paragraph_break(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    if !call.arguments.is_empty() {
        warn!(
            "{}: macro '.{}' takes no arguments; keeping them verbatim",
            call.reference, call.name
        );
    }
    t.fonts.reset();
    t.push_verbatim(call.line);
    Ok(())
}

/// `.TH title section date source manual` — the document header. Emits the
/// generated-file banner first; the section identifier stays untranslated.
fn handle_th(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    t.emit_banner();
    let args = split_args(call.arguments, call.reference)?;

    let mut out = Vec::with_capacity(args.len());
    for (index, arg) in args.iter().enumerate() {
        let kind = match index {
            0 => "TH.title",
            2 => "TH.date",
            3 => "TH.source",
            4 => "TH.manual",
            _ => {
                out.push(arg.clone());
                continue;
            }
        };
        let translated = t.translate_text(arg, call.reference, kind, false, None)?;
        out.push(single_line(&translated));
    }

    t.mdoc = false;
    t.fonts.reset();
    t.emit_macro_line(call.name, &out);
    Ok(())
}

/// `.SH`/`.SS` — section headings. The heading may sit on the next line;
/// headings are translated with a bold ambient font.
fn handle_section(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let mut args = split_args(call.arguments, call.reference)?;
    let mut reference = call.reference.clone();

    if args.is_empty() {
        match t.next_line()? {
            None => {
                t.emit_macro_line(call.name, &[]);
                return Ok(());
            }
            Some((line, line_reference)) => {
                let body = line.trim_end_matches('\n').to_string();
                if body.starts_with('.') || body.starts_with('\'') {
                    t.unshift_line(body, line_reference);
                    t.emit_macro_line(call.name, &[]);
                    return Ok(());
                }
                reference = line_reference;
                args = vec![body];
            }
        }
    }

    let joined = args.join(" ");
    t.fonts.set_regular("B");
    t.fonts.reset();
    let translated = t.translate_text(&joined, &reference, call.name, false, None);
    t.fonts.set_regular("R");
    t.fonts.reset();

    t.emit_macro_line(call.name, &[single_line(&translated?)]);
    Ok(())
}

/// `.TP` — the macro line passes through and the next line becomes the tag,
/// translated without wrapping. Interleaved `.PD` requests pass through.
fn handle_tagged_paragraph(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    t.push_verbatim(call.line);

    while let Some((line, reference)) = t.next_line()? {
        let body = line.trim_end_matches('\n').to_string();
        if !(body.starts_with('.') || body.starts_with('\'')) {
            let translated = t.translate_text(&body, &reference, "TP", false, None)?;
            t.push_translated_block(&translated);
            break;
        }

        let rest = body[1..].trim_start();
        let name = rest.split_whitespace().next().unwrap_or_default().to_string();
        let arguments = rest[name.len()..].trim_start().to_string();
        if name == "PD" {
            t.push_verbatim(&body);
            continue;
        }

        match t.handler_for(&name) {
            Some(MacroHandler::Font) => {
                let args = split_args(&arguments, &reference)?;
                let text = font_macro_text(&name, &args, &reference)?;
                let translated = t.translate_text(&text, &reference, "TP", false, None)?;
                t.push_translated_block(&translated);
            }
            Some(MacroHandler::Inline) => {
                let args = split_args(&arguments, &reference)?;
                let translated =
                    t.translate_text(&args.join(" "), &reference, "TP", false, None)?;
                t.emit_macro_line(&name, &[single_line(&translated)]);
            }
            _ => {
                // Not a tag after all; hand the line back to the parser.
                t.unshift_line(body, reference);
            }
        }
        break;
    }

    t.fonts.reset();
    Ok(())
}

/// `.IP [tag [indent]]` — the tag is translated, the indent value is not.
fn handle_indented_paragraph(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let args = split_args(call.arguments, call.reference)?;
    if args.is_empty() {
        t.push_verbatim(call.line);
    } else {
        let tag = t.translate_text(&args[0], call.reference, "IP", false, None)?;
        let mut out = vec![single_line(&tag)];
        out.extend(args[1..].iter().cloned());
        t.emit_macro_line(call.name, &out);
    }
    t.fonts.reset();
    Ok(())
}

/// `.UR url` — translated unless the placeholder `:` url is used.
fn handle_uri_start(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let args = split_args(call.arguments, call.reference)?;
    if args.is_empty() || args[0] == ":" {
        t.push_verbatim(call.line);
        return Ok(());
    }
    let translated = t.translate_text(&args.join(" "), call.reference, "UR", false, None)?;
    t.emit_macro_line(call.name, &[single_line(&translated)]);
    Ok(())
}

/// `.ft [name]` — updates the font stack; nothing is emitted because the
/// paragraph-level font processing re-materializes the active font inline.
fn handle_font_request(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let args = split_args(call.arguments, call.reference)?;
    t.fonts.apply_request(args.first().map(String::as_str));
    Ok(())
}

/// `.ds name value` — the value is translated under a `ds name` kind so
/// that string references remain findable in the catalog.
fn handle_string_define(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let trimmed = call.arguments.trim_start();
    let Some(name) = trimmed.split_whitespace().next() else {
        t.push_verbatim(call.line);
        return Ok(());
    };
    let value = trimmed[name.len()..].trim_start();
    if value.is_empty() {
        t.push_verbatim(call.line);
        return Ok(());
    }
    let kind = format!("ds {name}");
    let translated = t.translate_text(value, call.reference, &kind, false, None)?;
    t.push_verbatim(&format!(".ds {name} {}", single_line(&translated)));
    Ok(())
}

/// `.ig [end]` — everything up to the end marker passes through verbatim.
fn handle_ignore_block(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let args = split_args(call.arguments, call.reference)?;
    let terminator = format!(".{}", args.first().map(String::as_str).unwrap_or("."));

    t.push_verbatim(call.line);
    loop {
        let Some((raw, _)) = t.shift_raw_line()? else {
            return Err(TransformError::MalformedInput {
                reference: call.reference.clone(),
                message: format!("unterminated '.ig' block (no '{terminator}' found)"),
            });
        };
        t.push_verbatim(&raw);
        if raw.trim_end() == terminator {
            return Ok(());
        }
    }
}

/// `.ta` — tab stop specifications can carry translatable text.
fn handle_tab_stops(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let arguments = call.arguments.trim();
    if arguments.is_empty() {
        t.push_verbatim(call.line);
        return Ok(());
    }
    let translated = t.translate_text(arguments, call.reference, "ta", false, None)?;
    t.push_verbatim(&format!(".ta {}", single_line(&translated)));
    Ok(())
}

/// `.TS`…`.TE` — the tbl header passes through verbatim up to the format
/// terminator; each data cell is then translated independently.
///
/// The options and format lines are tbl syntax and are copied raw. Body
/// rows are ordinary input and take the regular logical-line preparation,
/// so escapes canonicalize and trailing comments split off exactly as they
/// do in paragraphs.
fn handle_table(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    t.push_verbatim(call.line);

    loop {
        let Some((raw, _)) = t.shift_raw_line()? else {
            return Err(unterminated_table(call));
        };
        let row = raw.trim_end();
        t.push_verbatim(row);
        if row.ends_with('.') {
            break;
        }
    }

    loop {
        let Some((line, reference)) = t.next_line()? else {
            return Err(unterminated_table(call));
        };
        let row = line.trim_end();

        if row == ".TE" {
            t.push_verbatim(row);
            return Ok(());
        }
        if row.is_empty() || row.starts_with('.') || row == "_" || row == "=" {
            t.push_verbatim(row);
            continue;
        }

        let mut cells = Vec::new();
        for cell in row.split('\t') {
            if cell.trim().is_empty() {
                cells.push(cell.to_string());
            } else {
                let translated = t.translate_text(cell, &reference, "tbl table", false, None)?;
                cells.push(single_line(&translated));
            }
        }
        t.push_verbatim(&cells.join("\t"));
    }
}

fn unterminated_table(call: &MacroCall<'_>) -> TransformError {
    TransformError::MalformedInput {
        reference: call.reference.clone(),
        message: "unterminated '.TS' table (no '.TE' found)".to_string(),
    }
}

/// `.so`/`.mso` — file inclusion is out of scope.
fn handle_inclusion(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let _ = t;
    Err(TransformError::Unsupported {
        reference: call.reference.clone(),
        message: format!(
            "'.{}' file inclusion; process the included file separately",
            call.name
        ),
    })
}

/// `.ce`/`.ul`/`.cu` — acceptable only when they cancel (count zero).
fn handle_counted_request(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let args = split_args(call.arguments, call.reference)?;
    let count = args
        .first()
        .and_then(|value| value.parse::<i64>().ok())
        .unwrap_or(1);
    if count > 0 {
        return Err(TransformError::Unsupported {
            reference: call.reference.clone(),
            message: format!("'.{}' with a positive line count", call.name),
        });
    }
    t.push_verbatim(call.line);
    Ok(())
}

/// `.ec` — changing the escape character would invalidate every assumption
/// the parser makes.
fn handle_escape_char(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    if !call.arguments.trim().is_empty() {
        return Err(TransformError::Unsupported {
            reference: call.reference.clone(),
            message: "'.ec' with an argument".to_string(),
        });
    }
    t.push_verbatim(call.line);
    Ok(())
}

fn handle_stray_else(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    let _ = t;
    Err(TransformError::Unsupported {
        reference: call.reference.clone(),
        message: "'.el' without a preceding '.ie'".to_string(),
    })
}

/// `.de` — handled according to the groff_code policy.
fn handle_definition(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    if t.options.groff_code == GroffCodePolicy::Fail {
        return Err(TransformError::Unsupported {
            reference: call.reference.clone(),
            message: "'.de' macro definition (set groff_code to verbatim or translate)"
                .to_string(),
        });
    }

    let mut block = String::from(call.line);
    block.push('\n');
    loop {
        let Some((raw, _)) = t.shift_raw_line()? else {
            return Err(TransformError::MalformedInput {
                reference: call.reference.clone(),
                message: "unterminated '.de' definition (no '..' found)".to_string(),
            });
        };
        let done = raw.trim_end() == "..";
        block.push_str(&raw);
        block.push('\n');
        if done {
            break;
        }
    }

    emit_groff_block(t, call, block)
}

/// `.if`/`.ie` — handled according to the groff_code policy. An `.ie`
/// additionally owns its `.el` branch.
fn handle_conditional(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    if t.options.groff_code == GroffCodePolicy::Fail {
        return Err(TransformError::Unsupported {
            reference: call.reference.clone(),
            message: format!(
                "'.{}' conditional (set groff_code to verbatim or translate)",
                call.name
            ),
        });
    }

    let mut block = String::new();
    collect_conditional_block(t, call, call.line, &mut block)?;

    if call.name == "ie" {
        let Some((raw, _)) = t.shift_raw_line()? else {
            return Err(TransformError::MalformedInput {
                reference: call.reference.clone(),
                message: "'.ie' without a matching '.el' branch".to_string(),
            });
        };
        let trimmed = raw.trim_start();
        if !(trimmed.starts_with(".el") || trimmed.starts_with("'el")) {
            return Err(TransformError::MalformedInput {
                reference: call.reference.clone(),
                message: format!("'.ie' without a matching '.el' branch (found '{raw}')"),
            });
        }
        collect_conditional_block(t, call, &raw, &mut block)?;
    }

    emit_groff_block(t, call, block)
}

fn collect_conditional_block(
    t: &mut Transformer<'_>,
    call: &MacroCall<'_>,
    first_line: &str,
    block: &mut String,
) -> Result<()> {
    let mut balance = brace_balance(first_line);
    block.push_str(first_line);
    block.push('\n');

    while balance > 0 {
        let Some((raw, _)) = t.shift_raw_line()? else {
            return Err(TransformError::MalformedInput {
                reference: call.reference.clone(),
                message: format!("unterminated '.{}' conditional block", call.name),
            });
        };
        balance += brace_balance(&raw);
        block.push_str(&raw);
        block.push('\n');
    }
    Ok(())
}

fn brace_balance(line: &str) -> i64 {
    line.matches("\\{").count() as i64 - line.matches("\\}").count() as i64
}

fn emit_groff_block(t: &mut Transformer<'_>, call: &MacroCall<'_>, block: String) -> Result<()> {
    match t.options.groff_code {
        GroffCodePolicy::Verbatim => {
            t.catalog.push_output(&block);
            Ok(())
        }
        GroffCodePolicy::Translate => {
            // Requests must reach the catalog untouched: the surface
            // transforms would escape their control characters.
            let content = block.trim_end_matches('\n');
            let translated = t.catalog.translate(
                content,
                call.reference,
                "groff code",
                TranslateOptions::unwrapped(),
            );
            t.push_translated_block(&translated);
            Ok(())
        }
        GroffCodePolicy::Fail => unreachable!("fail policy rejected before collection"),
    }
}

/// Flattens a translation used as a macro argument onto one line.
pub(crate) fn single_line(translated: &str) -> String {
    let flat = translated.trim_end_matches('\n');
    if flat.contains('\n') {
        warn!("newline inside a macro argument translation; joining with spaces");
        flat.replace('\n', " ")
    } else {
        flat.to_string()
    }
}
