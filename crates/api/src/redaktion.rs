//! Log-Redaktion fuer Formulardaten
//!
//! Formular-Submissions werden auf Debug-Level mitgeloggt; Passwoerter
//! und Reset-Tokens duerfen dabei nie im Klartext in den Logs landen.

use regex::{NoExpand, Regex};

/// Ersetzt die Werte der angegebenen Felder in einer Lognachricht
///
/// Erwartet Nachrichten der Form `feld=wert<trenner>feld=wert<trenner>...`
/// und ersetzt jeden Wert eines genannten Feldes durch `ersatz`.
pub fn felder_redigieren(felder: &[&str], ersatz: &str, nachricht: &str, trenner: char) -> String {
    let trenner_muster = regex::escape(&trenner.to_string());
    let mut ergebnis = nachricht.to_string();

    for feld in felder {
        let muster = format!(
            "{feld}=[^{trenner_muster}]*{trenner_muster}",
            feld = regex::escape(feld)
        );
        let re = Regex::new(&muster).expect("Redaktions-Muster ungueltig");
        let ersetzt = format!("{feld}={ersatz}{trenner}");
        ergebnis = re.replace_all(&ergebnis, NoExpand(&ersetzt)).into_owned();
    }

    ergebnis
}
