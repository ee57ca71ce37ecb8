//! The mdoc(7) dispatch table.
//!
//! Installed on the first `.Dd`. Block macros translate joined, the domain
//! vocabulary is inline so that `.Fl`, `.Ar` and friends stay embedded in
//! the sentences that reference them.

use crate::Transformer;
use crate::args::split_args;
use crate::error::Result;
use crate::macros::{MacroCall, MacroHandler, MacroTable, apply_option_lists};
use crate::macros::man::{insert_groff_requests, single_line};
use crate::options::TransformOptions;

/// Block macros whose joined arguments form one translation unit.
const TRANSLATE_JOINED: &[&str] = &["Sh", "Ss", "D1", "Dl", "It", "Nd", "In"];

/// One- and two-letter domain macros embedded into their sentence.
const INLINE: &[&str] = &[
    "Ad", "An", "Ao", "Ac", "Aq", "Ar", "At", "Bc", "Bo", "Bq", "Brq", "Bsx", "Bx", "Cd", "Cm",
    "Db", "Dc", "Do", "Dq", "Dv", "Dx", "Ec", "Em", "Eo", "Er", "Ev", "Ex", "Fa", "Fc", "Fd",
    "Fl", "Fn", "Fo", "Ft", "Fx", "Ic", "Lb", "Li", "Lk", "Ms", "Mt", "Nm", "No", "Ns", "Nx",
    "Oc", "Oo", "Op", "Ot", "Ox", "Pa", "Pc", "Pf", "Po", "Pq", "Qc", "Ql", "Qo", "Qq", "Rv",
    "Sc", "So", "Sq", "St", "Sx", "Sy", "Ta", "Tn", "Ud", "Ux", "Va", "Vt", "Xc", "Xo", "Xr",
    "%A", "%B", "%C", "%D", "%I", "%J", "%N", "%O", "%P", "%Q", "%R", "%T", "%U", "%V",
];

/// Builds the dispatch table active after `.Dd`.
pub(crate) fn build_table(options: &TransformOptions) -> MacroTable {
    let mut table = MacroTable::new();
    insert_groff_requests(&mut table);

    for name in TRANSLATE_JOINED {
        table.insert(name.to_string(), MacroHandler::TranslateJoined);
    }
    for name in INLINE {
        table.insert(name.to_string(), MacroHandler::Inline);
    }
    for name in ["Pp", "El"] {
        table.insert(name.to_string(), MacroHandler::NoArg);
    }
    for name in ["Bl", "Dt", "Os"] {
        table.insert(name.to_string(), MacroHandler::Untranslated);
    }
    table.insert("Dd".to_string(), MacroHandler::Structural(handle_document_date));

    // Documents occasionally mix in the legacy font macros.
    for name in ["B", "I", "BI", "BR", "IB", "IR", "RB", "RI"] {
        table.insert(name.to_string(), MacroHandler::Font);
    }

    apply_option_lists(&mut table, options);
    table
}

/// `.Dd date` — switches the parser into mdoc mode, installs this table,
/// emits the header banner and translates the date.
pub(crate) fn handle_document_date(t: &mut Transformer<'_>, call: &MacroCall<'_>) -> Result<()> {
    t.emit_banner();
    t.mdoc = true;
    t.install_mdoc_table();

    let args = split_args(call.arguments, call.reference)?;
    if args.is_empty() {
        t.push_verbatim(call.line);
        return Ok(());
    }
    let translated = t.translate_text(&args.join(" "), call.reference, "Dd", false, None)?;
    t.push_verbatim(&format!(".Dd {}", single_line(&translated)));
    Ok(())
}
