use crate::Result;
use crate::signals::RepoSpec;
use camino::{Utf8Path, Utf8PathBuf};
use ohno::{IntoAppError, app_err};
use std::fs::File;
use std::io::{self, BufRead, BufReader};

/// Path that stands for standard input.
pub const STDIN_PATH: &str = "-";

type Reader = Box<dyn BufRead + Send>;

/// Read repository URLs, one per line, from each input in turn.
///
/// All inputs are opened up front; lines are read and parsed lazily. Surrounding
/// whitespace is trimmed and blank lines are skipped. A line that is not a valid
/// repository URL yields an error naming the input and line number.
///
/// # Errors
///
/// Returns an error if an input file cannot be opened
pub fn read_input(paths: &[Utf8PathBuf]) -> Result<impl Iterator<Item = Result<RepoSpec>> + Send + use<>> {
    let mut readers: Vec<(Utf8PathBuf, Reader)> = Vec::with_capacity(paths.len());
    for path in paths {
        let reader: Reader = if path.as_str() == STDIN_PATH {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let file = File::open(path).into_app_err_with(|| format!("opening input file '{path}'"))?;
            Box::new(BufReader::new(file))
        };
        readers.push((path.clone(), reader));
    }

    Ok(readers.into_iter().flat_map(|(path, reader)| parse_lines(path, reader)))
}

fn parse_lines(name: Utf8PathBuf, reader: impl BufRead) -> impl Iterator<Item = Result<RepoSpec>> {
    reader.lines().enumerate().filter_map(move |(index, line)| {
        let line_number = index + 1;
        match line {
            Err(e) => Some(Err(e).into_app_err_with(|| describe(&name, line_number))),
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    None
                } else {
                    Some(line.parse::<RepoSpec>().map_err(|e| app_err!("{}: {e}", describe(&name, line_number))))
                }
            }
        }
    })
}

fn describe(name: &Utf8Path, line_number: usize) -> String {
    if name.as_str() == STDIN_PATH {
        format!("standard input, line {line_number}")
    } else {
        format!("'{name}', line {line_number}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn test_trims_and_skips_blank_lines() {
        let text = "  https://github.com/a/one  \n\n\t\nhttps://github.com/a/two.git\n";
        let repos: Vec<String> = parse_lines(Utf8PathBuf::from("list.txt"), Cursor::new(text))
            .map(|r| r.unwrap().to_string())
            .collect();
        assert_eq!(repos, vec!["https://github.com/a/one", "https://github.com/a/two"]);
    }

    #[test]
    fn test_bad_line_reports_position() {
        let text = "https://github.com/a/one\n\nnot a url\nhttps://github.com/a/two\n";
        let results: Vec<Result<RepoSpec>> = parse_lines(Utf8PathBuf::from("list.txt"), Cursor::new(text)).collect();

        assert_eq!(results.len(), 3);
        let err = results[1].as_ref().unwrap_err();
        assert!(format!("{err:#}").contains("'list.txt', line 3"), "{err:#}");
        let _ = results[2].as_ref().unwrap();
    }

    #[test]
    fn test_reads_files_in_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let first = Utf8PathBuf::from_path_buf(temp_dir.path().join("first.txt")).unwrap();
        let second = Utf8PathBuf::from_path_buf(temp_dir.path().join("second.txt")).unwrap();
        fs::write(&first, "https://github.com/a/one\nhttps://github.com/a/two\n").unwrap();
        fs::write(&second, "https://github.com/b/three\n").unwrap();

        let repos: Vec<String> = read_input(&[first, second])
            .unwrap()
            .map(|r| r.unwrap().full_name())
            .collect();
        assert_eq!(repos, vec!["a/one", "a/two", "b/three"]);
    }

    #[test]
    fn test_missing_file_fails_up_front() {
        let missing = Utf8PathBuf::from("does-not-exist-424242.txt");
        let Err(err) = read_input(&[missing]) else {
            panic!("expected an error for a missing input file");
        };
        assert!(format!("{err:#}").contains("does-not-exist-424242.txt"));
    }
}
