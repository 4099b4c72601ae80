use mentionpad::{
    Category, Directory, DirectoryEntry, DocumentSurface, FormatKind, MentionEditor,
    config::EditorConfig,
    extract, interchange,
    mention::{self, ScanOutcome, TriggerScanner},
    render::render_document,
};
use std::time::{Duration, Instant};
use tdoc::{Document, Paragraph, Span};

/// Performance benchmark suite for the mention editing core
///
/// Run with: cargo test --release --bench performance -- --nocapture
///
/// This measures:
/// - Document rendering performance
/// - Trigger scanning at the end of long documents
/// - Candidate filtering over large directories
/// - Mention insertion and format refresh
/// - Content extraction and snapshots
const SMALL_DOC_PARAGRAPHS: usize = 10;
const MEDIUM_DOC_PARAGRAPHS: usize = 100;
const LARGE_DOC_PARAGRAPHS: usize = 1000;

const ITERATIONS: usize = 100;

const SAMPLE_WORDS: &[&str] = &[
    "Lorem",
    "ipsum",
    "dolor",
    "sit",
    "amet",
    "consectetur",
    "adipiscing",
    "elit",
    "sed",
    "do",
    "eiusmod",
    "tempor",
    "incididunt",
    "ut",
    "labore",
    "et",
    "dolore",
    "magna",
    "aliqua",
];

/// Create a test document with the specified number of paragraphs
fn create_test_document(num_paragraphs: usize, avg_words_per_para: usize) -> DocumentSurface {
    let mut doc = Document::new();

    for i in 0..num_paragraphs {
        let mut text = String::new();
        for j in 0..avg_words_per_para {
            if j > 0 {
                text.push(' ');
            }
            text.push_str(SAMPLE_WORDS[(i + j) % SAMPLE_WORDS.len()]);
        }
        doc.add_paragraph(Paragraph::new_text().with_content(vec![Span::new_text(&text)]));
    }

    DocumentSurface::new(interchange::document_to_root(&doc))
}

/// Create a document where every paragraph carries a mention link
fn create_mention_document(num_paragraphs: usize) -> DocumentSurface {
    let mut doc = Document::new();

    for i in 0..num_paragraphs {
        let mut link = Span::new_text("alice");
        link.link_target = Some(format!("mention:user:{}", i % 5 + 1));
        let paragraph = Paragraph::new_text().with_content(vec![
            Span::new_text(&format!("Paragraph {i} was reviewed by ")),
            link,
            Span::new_text(" yesterday."),
        ]);
        doc.add_paragraph(paragraph);
    }

    DocumentSurface::new(interchange::document_to_root(&doc))
}

fn create_directory(people: usize, objects: usize) -> Directory {
    let people = (0..people).map(|i| {
        let name = format!("{} Person{i}", SAMPLE_WORDS[i % SAMPLE_WORDS.len()]);
        DirectoryEntry::person(i as u64, &name, &format!("user{i}"))
    });
    let objects = (0..objects).map(|i| {
        let name = format!("Project {i}");
        DirectoryEntry::object(i as u64, &name, SAMPLE_WORDS[i % SAMPLE_WORDS.len()])
    });
    Directory::new(people.chain(objects))
}

struct BenchmarkResult {
    name: String,
    iterations: usize,
    total_duration: Duration,
    avg_duration: Duration,
    min_duration: Duration,
    max_duration: Duration,
}

impl BenchmarkResult {
    fn print(&self) {
        println!("\n{}", "=".repeat(70));
        println!("Benchmark: {}", self.name);
        println!("{}", "=".repeat(70));
        println!("Iterations:     {}", self.iterations);
        println!("Total time:     {:?}", self.total_duration);
        println!("Average:        {:?}", self.avg_duration);
        println!("Min:            {:?}", self.min_duration);
        println!("Max:            {:?}", self.max_duration);
        println!(
            "Ops/sec:        {:.2}",
            1_000_000.0 / self.avg_duration.as_micros().max(1) as f64
        );

        // Highlight if performance is concerning
        if self.avg_duration.as_millis() > 100 {
            println!("\n⚠️  WARNING: Average duration > 100ms (user-perceptible lag)");
        } else if self.avg_duration.as_millis() > 16 {
            println!("\n⚠️  WARNING: Average duration > 16ms (may drop frames)");
        }
    }
}

fn benchmark<F>(name: &str, iterations: usize, mut f: F) -> BenchmarkResult
where
    F: FnMut(),
{
    let mut durations = Vec::with_capacity(iterations);

    // Warmup
    for _ in 0..10 {
        f();
    }

    for _ in 0..iterations {
        let start = Instant::now();
        f();
        durations.push(start.elapsed());
    }

    let total_duration: Duration = durations.iter().sum();
    let avg_duration = total_duration / iterations as u32;
    let min_duration = *durations.iter().min().unwrap();
    let max_duration = *durations.iter().max().unwrap();

    BenchmarkResult {
        name: name.to_string(),
        iterations,
        total_duration,
        avg_duration,
        min_duration,
        max_duration,
    }
}

fn sizes() -> Vec<(&'static str, usize)> {
    vec![
        ("Small", SMALL_DOC_PARAGRAPHS),
        ("Medium", MEDIUM_DOC_PARAGRAPHS),
        ("Large", LARGE_DOC_PARAGRAPHS),
    ]
}

#[test]
fn bench_rendering_performance() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           RENDERING PERFORMANCE BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (label, paragraphs) in sizes() {
        let surface = create_mention_document(paragraphs);
        let cursor = surface.cursor_unit();
        let result = benchmark(
            &format!("Render {label} document ({paragraphs} paragraphs)"),
            ITERATIONS,
            || {
                let _ = render_document(surface.root(), 80, &[], cursor);
            },
        );
        result.print();
    }
}

#[test]
fn bench_trigger_scan_at_document_end() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           TRIGGER SCAN BENCHMARKS                              ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let scanner = TriggerScanner::new(0.0);
    for (label, paragraphs) in sizes() {
        let mut surface = create_test_document(paragraphs, 50);
        surface.move_to_end();
        surface.insert_text(" @lor");
        assert!(matches!(scanner.scan(&surface), ScanOutcome::Open(_)));

        let result = benchmark(
            &format!("Scan {label} document ({paragraphs} paragraphs)"),
            ITERATIONS,
            || {
                let _ = scanner.scan(&surface);
            },
        );
        result.print();
    }
}

#[test]
fn bench_candidate_filter() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           CANDIDATE FILTER BENCHMARKS                          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for size in [100, 1_000, 10_000] {
        let directory = create_directory(size, size);
        for query in ["", "lo", "person99", "zzz"] {
            let result = benchmark(
                &format!("Filter {size} entries for {query:?}"),
                ITERATIONS,
                || {
                    let _ = mention::filter(query, Category::Person, &directory);
                },
            );
            result.print();
        }
    }
}

#[test]
fn bench_mention_commit() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           MENTION COMMIT BENCHMARKS                            ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (label, paragraphs) in sizes() {
        let mut editor = MentionEditor::new(
            create_test_document(paragraphs, 30),
            Directory::sample(),
            EditorConfig::default(),
        );
        editor.focus();

        let result = benchmark(
            &format!("Type trigger and commit in {label} document"),
            ITERATIONS / 4,
            || {
                editor.type_text(" @al");
                editor.commit_selected().unwrap();
            },
        );
        result.print();
        assert!(!editor.parse_content().mentions.is_empty());
    }
}

#[test]
fn bench_format_toggle_and_refresh() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           FORMAT TOGGLE BENCHMARKS                             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (label, paragraphs) in sizes() {
        let mut editor = MentionEditor::new(
            create_test_document(paragraphs, 30),
            Directory::sample(),
            EditorConfig::default(),
        );
        editor.focus();
        let len = editor.surface().unit_len();
        editor.surface_mut().select_units(len.saturating_sub(40), len);

        let result = benchmark(
            &format!("Toggle bold on {label} document"),
            ITERATIONS,
            || {
                editor.apply_format(FormatKind::Bold);
                editor.run_deferred();
            },
        );
        result.print();

        let result = benchmark(
            &format!("Center-align on {label} document"),
            ITERATIONS,
            || {
                editor.apply_format(FormatKind::AlignCenter);
                editor.run_deferred();
            },
        );
        result.print();
    }
}

#[test]
fn bench_extraction_and_snapshot() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           EXTRACTION & SNAPSHOT BENCHMARKS                     ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    for (label, paragraphs) in sizes() {
        let surface = create_mention_document(paragraphs);
        assert_eq!(extract::parse_content(&surface).mentions.len(), paragraphs);

        let result = benchmark(
            &format!("Parse content of {label} document"),
            ITERATIONS,
            || {
                let _ = extract::parse_content(&surface);
            },
        );
        result.print();

        let editor = MentionEditor::new(surface, Directory::sample(), EditorConfig::default());
        let result = benchmark(
            &format!("Snapshot {label} document"),
            ITERATIONS,
            || {
                let _ = editor.snapshot();
            },
        );
        result.print();
    }
}

#[test]
fn bench_ftml_round_trip() {
    println!("\n\n╔════════════════════════════════════════════════════════════════╗");
    println!("║           FTML INTERCHANGE BENCHMARKS                          ║");
    println!("╚════════════════════════════════════════════════════════════════╝");

    let surface = create_mention_document(MEDIUM_DOC_PARAGRAPHS);
    let ftml = interchange::export_ftml(surface.root()).unwrap();

    let result = benchmark("Export medium document", ITERATIONS, || {
        let _ = interchange::export_ftml(surface.root());
    });
    result.print();

    let result = benchmark("Import medium document", ITERATIONS, || {
        let _ = interchange::import_ftml_str(&ftml);
    });
    result.print();
}
