use fits_layout::hdu::{reorder_headers, scan_hdus, HduLayout};
use std::fs::{File, OpenOptions};
use std::process;

const USAGE: &str = "Usage: fitsorder [--fix] <file.fits>\n\n\
Check that header keywords of every HDU are in legal order.\n\
With --fix, misordered headers are reordered and rewritten in place.";

fn format_hdu(index: usize, hdu: &HduLayout) -> String {
    let header = hdu.header.payload();
    match header.first_out_of_order() {
        None => format!("HDU {}: ordered\n", index),
        Some(pos) => format!(
            "HDU {}: {} out of order (card {})\n",
            index,
            header.cards()[pos].keyword_str(),
            pos + 1
        ),
    }
}

fn check(path: &str) -> Result<String, String> {
    let mut file = File::open(path).map_err(|e| format!("Error reading '{}': {}", path, e))?;
    let hdus =
        scan_hdus(&mut file).map_err(|e| format!("Error parsing '{}': {}", path, e))?;
    if hdus.is_empty() {
        return Err(format!("Error parsing '{}': no HDUs found", path));
    }
    Ok(hdus
        .iter()
        .enumerate()
        .map(|(i, hdu)| format_hdu(i, hdu))
        .collect())
}

fn fix(path: &str) -> Result<String, String> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|e| format!("Error opening '{}': {}", path, e))?;
    let rewritten =
        reorder_headers(&mut file).map_err(|e| format!("Error rewriting '{}': {}", path, e))?;
    if rewritten.is_empty() {
        return Ok("All headers already ordered\n".to_string());
    }
    Ok(rewritten
        .iter()
        .map(|i| format!("HDU {}: reordered\n", i))
        .collect())
}

fn run(args: &[String]) -> Result<String, String> {
    let mut fix_mode = false;
    let mut file_path = None;

    for arg in args {
        if arg == "--fix" {
            fix_mode = true;
        } else if arg.starts_with('-') {
            return Err(format!("Unknown option: {}", arg));
        } else {
            if file_path.is_some() {
                return Err("Too many arguments".to_string());
            }
            file_path = Some(arg.as_str());
        }
    }

    let path = file_path.ok_or_else(|| USAGE.to_string())?;
    if fix_mode {
        fix(path)
    } else {
        check(path)
    }
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => print!("{}", output),
        Err(msg) => {
            eprintln!("{}", msg);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fits_layout::header::Header;
    use fits_layout::Segment;
    use std::io::Write;

    fn misordered_file() -> tempfile::NamedTempFile {
        let mut header = Header::new();
        header.set_logical("SIMPLE", true, None).unwrap();
        header.set_integer("NAXIS", 0, None).unwrap();
        header.set_integer("BITPIX", 8, None).unwrap();

        let mut bytes = Vec::new();
        Segment::new(header).write_to(&mut bytes).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();
        file.flush().unwrap();
        file
    }

    fn path_arg(file: &tempfile::NamedTempFile) -> String {
        file.path().to_str().unwrap().to_string()
    }

    #[test]
    fn run_no_args() {
        let result = run(&[]);
        assert!(result.unwrap_err().contains("Usage:"));
    }

    #[test]
    fn run_unknown_option() {
        let args = vec!["--foo".to_string()];
        assert!(run(&args).unwrap_err().contains("Unknown option"));
    }

    #[test]
    fn run_too_many_args() {
        let args = vec!["a.fits".to_string(), "b.fits".to_string()];
        assert!(run(&args).unwrap_err().contains("Too many arguments"));
    }

    #[test]
    fn run_missing_file() {
        let args = vec!["nonexistent.fits".to_string()];
        assert!(run(&args).unwrap_err().contains("Error reading"));
    }

    #[test]
    fn check_reports_misordered_keyword() {
        let file = misordered_file();
        let output = run(&[path_arg(&file)]).unwrap();
        assert_eq!(output, "HDU 0: BITPIX out of order (card 3)\n");
    }

    #[test]
    fn fix_then_check() {
        let file = misordered_file();
        let output = run(&["--fix".to_string(), path_arg(&file)]).unwrap();
        assert_eq!(output, "HDU 0: reordered\n");

        let output = run(&[path_arg(&file)]).unwrap();
        assert_eq!(output, "HDU 0: ordered\n");

        let output = run(&["--fix".to_string(), path_arg(&file)]).unwrap();
        assert_eq!(output, "All headers already ordered\n");
    }
}
