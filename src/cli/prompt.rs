//! Lectura de opciones desde la terminal.

use std::io::{self, Write};

/// Imprime el prompt y devuelve la línea ingresada, sin el salto final.
pub fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Pregunta sí/no; solo `s`/`si` (en cualquier caja) cuenta como afirmativo.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    let answer = read_line(&format!("{prompt} (s/n): "))?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "s" || answer == "si" || answer == "sí")
}
