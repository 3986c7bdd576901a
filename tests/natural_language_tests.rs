use builder_schedule::ingest::{ExtractionSource, NaturalLanguageExtractor, default_project};

#[test]
fn unrecognized_text_yields_default_project() {
    let extractor = NaturalLanguageExtractor::new();
    let extraction = extractor.extract("Necesito un presupuesto para la próxima semana");

    assert_eq!(extraction.source, ExtractionSource::DefaultProject);
    assert_eq!(extraction.table, default_project());

    let durations: Vec<i64> = extraction.table.iter().map(|a| a.duration_days).collect();
    assert_eq!(durations, vec![5, 10, 15, 8, 6, 12, 10]);
    let activities = extraction.table.activities();
    for pair in activities.windows(2) {
        assert_eq!(pair[1].predecessors, vec![pair[0].name.clone()]);
    }
}

#[test]
fn numbered_spanish_list_is_read_line_by_line() {
    let text = "Proyecto: vivienda unifamiliar\n\
                1. Excavación - 5 días\n\
                2. Cimentación — 10 días (después de Excavación)\n\
                3. Estructura: 15 días después de Cimentación\n\
                \n\
                4. Muros – 8 días: Estructura\n";
    let extraction = NaturalLanguageExtractor::new().extract(text);

    assert_eq!(extraction.source, ExtractionSource::LinePatterns);
    let rows: Vec<(&str, i64, Vec<String>)> = extraction
        .table
        .iter()
        .map(|a| (a.name.as_str(), a.duration_days, a.predecessors.clone()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("Excavación", 5, vec![]),
            ("Cimentación", 10, vec!["Excavación".to_string()]),
            ("Estructura", 15, vec!["Cimentación".to_string()]),
            ("Muros", 8, vec!["Estructura".to_string()]),
        ]
    );
}

#[test]
fn english_phrasings_are_supported() {
    let text = "Site clearing - 3 days\n\
                Excavation: 5 days (Site clearing)\n\
                Foundation - 10 days (after Excavation)";
    let extraction = NaturalLanguageExtractor::new().extract(text);
    let table = extraction.table;

    assert_eq!(table.len(), 3);
    assert_eq!(
        table.find("Excavation").unwrap().predecessors,
        vec!["Site clearing"]
    );
    assert_eq!(
        table.find("Foundation").unwrap().predecessors,
        vec!["Excavation"]
    );
}

#[test]
fn keywords_are_used_when_no_line_matches() {
    let extraction = NaturalLanguageExtractor::new()
        .extract("Build a two-storey house with excavation, foundation, structure and finishing.");
    assert_eq!(extraction.source, ExtractionSource::Keywords);

    let names: Vec<&str> = extraction.table.names().collect();
    assert_eq!(names, vec!["Excavation", "Foundation", "Structure", "Finishing"]);
    assert_eq!(
        extraction.table.find("Finishing").unwrap().predecessors,
        vec!["Structure"]
    );
}
