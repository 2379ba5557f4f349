use std::path::Path;
use std::process;

use tagwright::demo_parser::{self, FileSource};
use tagwright::field::{FieldRegistry, RenderContext};
use tagwright::file_finder::{self, FileFinder, FileFinderResult};
use tagwright::options::{Options, SortRequest};
use tagwright::sort::LexicalSort;
use tagwright::writer::EtagsGroup;
use tagwright::{Engine, TagFile};

/// Parses command-line options, finds or creates a tag file, scans the
/// requested source files, and writes them out in the requested format.
fn main() {
    let options = Options::new();

    let tag_file_path = match file_finder::determine_tag_file_path(&options.tag_file, options.append)
    {
        Ok(path) => path,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let search_base = Path::new(&tag_file_path);
    let finder = match FileFinder::from_patterns(search_base, options.exclude.clone()) {
        Ok(finder) => finder,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };
    let found = if !options.file_names.is_empty() {
        finder.get_files_from_paths(&options.file_names)
    } else {
        finder.get_files_from_dir()
    };
    found.print_errors();

    if options.etags {
        run_etags_mode(&tag_file_path, &found);
        return;
    }

    let mut registry = FieldRegistry::new();
    options.apply_fields(&mut registry);
    let render_ctx = RenderContext {
        put_field_prefix: options.put_field_prefix,
    };
    let writer_kind = options.writer_kind();

    let tag_file = match TagFile::open(
        Path::new(&tag_file_path),
        writer_kind,
        options.tag_file_format,
        options.append,
        options.output_encoding.as_deref(),
    ) {
        Ok(tag_file) => tag_file,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let mut engine = Engine::new(
        tag_file,
        registry,
        render_ctx,
        options.backward,
        options.pattern_length_limit,
    );

    for path in &found.files {
        let mut source = match FileSource::read(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("warning: {path}: {err}");
                continue;
            }
        };
        engine.on_new_input_file();
        if let Err(err) = demo_parser::scan_file(&mut engine, &mut source) {
            eprintln!("{err}");
            process::exit(1);
        }
    }

    let sort_stage = LexicalSort;
    let sort_request: Option<(&dyn tagwright::SortStage, bool)> = match options.sort {
        SortRequest::Unsorted => None,
        SortRequest::Sorted => Some((&sort_stage, false)),
        SortRequest::FoldCase => Some((&sort_stage, true)),
    };

    if let Err(err) = engine.close(sort_request) {
        eprintln!("{err}");
        process::exit(1);
    }
}

/// Etags output bypasses the field registry and the `Engine`/cork
/// pipeline entirely (spec.md §4.5): each input file becomes its own
/// form-feed-delimited group of flat, unscoped entries.
fn run_etags_mode(tag_file_path: &str, found: &FileFinderResult) {
    let mut rendered = String::new();

    for path in &found.files {
        let mut source = match FileSource::read(path) {
            Ok(source) => source,
            Err(err) => {
                eprintln!("warning: {path}: {err}");
                continue;
            }
        };
        let entries = demo_parser::scan_file_flat(&mut source);
        if entries.is_empty() {
            continue;
        }
        let mut group = EtagsGroup::new(path.as_str());
        for entry in &entries {
            group.push(entry);
        }
        rendered.push_str(&group.render());
    }

    if tag_file_path == "-" {
        print!("{rendered}");
    } else if let Err(err) = std::fs::write(tag_file_path, rendered) {
        eprintln!("{err}: {tag_file_path}");
        process::exit(1);
    }
}
