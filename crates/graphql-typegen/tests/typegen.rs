use graphql_typegen::{
    parse_schema, CodegenError, CompileError, DocumentCompiler, ExtractConfig, ExtractionResult, Extractor,
    Language, Module, ProjectConfig, SchemaLoader, TypeGenerator, TypeScriptCompiler,
    TypegenError, Valid, Schema, COMPLEX_DOCUMENT_MESSAGE,
};
use insta::assert_snapshot;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const PROJECT_ROOT: &str = "/project";

fn load_schema() -> Valid<Schema> {
    parse_schema(include_str!("fixtures/schema.graphql"), "schema.graphql")
        .expect("fixture schema is valid")
}

fn extract(file_name: &str, source: &str) -> Vec<ExtractionResult> {
    Extractor::new(ExtractConfig::default())
        .extract_source(
            &Path::new(PROJECT_ROOT).join(file_name),
            source,
            Language::TypeScript,
        )
        .expect("extraction succeeds")
}

fn generator() -> TypeGenerator<TypeScriptCompiler> {
    TypeGenerator::new(PROJECT_ROOT, TypeScriptCompiler::new())
}

#[test]
fn test_single_operation_generates_one_file() {
    let results = extract("a/b.ts", "export const query = gql`query Foo { field }`;\n");
    let output = generator().generate(&results, &load_schema()).unwrap();

    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(output.outputs.len(), 1);
    assert_eq!(
        output.outputs[0].file_name,
        PathBuf::from("/project/a/__generated__/foo.ts")
    );
    assert_snapshot!("foo_query", output.outputs[0].content);
}

#[test]
fn test_fragment_uses_field_descriptions() {
    let source = r"
export const userParts = gql`
  fragment UserParts on User {
    id
    name
    friends {
      id
    }
  }
`;
";
    let results = extract("src/user.ts", source);
    let output = generator().generate(&results, &load_schema()).unwrap();

    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(
        output.outputs[0].file_name,
        PathBuf::from("/project/src/__generated__/user-parts.ts")
    );
    assert_snapshot!("user_parts_fragment", output.outputs[0].content);
}

#[test]
fn test_complex_document_reports_whole_literal() {
    let source = "const both = gql`query A { field } query B { field }`;";
    let results = extract("a.ts", source);
    let output = generator().generate(&results, &load_schema()).unwrap();

    assert!(output.outputs.is_empty());
    assert_eq!(output.errors.len(), 1);

    let error = &output.errors[0];
    assert_eq!(error.message, COMPLEX_DOCUMENT_MESSAGE);
    assert_eq!(error.file_name, Path::new("/project/a.ts"));
    assert_eq!(error.start, source.find('`').unwrap());
    assert_eq!(error.end, source.rfind('`').unwrap() + 1);
    assert_eq!(error.start, results[0].literal.start);
    assert_eq!(error.end, results[0].literal.end);
}

#[test]
fn test_operation_and_fragment_together_are_complex() {
    let source = "const doc = gql`query A { viewer { ...U } } fragment U on User { id }`;";
    let output = generator()
        .generate(&extract("a.ts", source), &load_schema())
        .unwrap();

    assert!(output.outputs.is_empty());
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].message, COMPLEX_DOCUMENT_MESSAGE);
}

#[test]
fn test_anonymous_operation_is_skipped() {
    let results = extract("a.ts", "const q = gql`{ field }`;");
    let output = generator().generate(&results, &load_schema()).unwrap();

    assert!(output.outputs.is_empty());
    assert!(output.errors.is_empty());
}

#[test]
fn test_unparsed_literal_is_ignored() {
    let results = extract(
        "a.ts",
        "const bad = gql`query Bad {`;\nconst good = gql`query Good { field }`;",
    );
    assert!(results[0].document.is_none());

    let output = generator().generate(&results, &load_schema()).unwrap();
    assert!(output.errors.is_empty());
    assert_eq!(output.outputs.len(), 1);
    assert_eq!(
        output.outputs[0].file_name,
        PathBuf::from("/project/__generated__/good.ts")
    );
}

#[test]
fn test_codegen_error_is_located_in_source() {
    let source = "const bad = gql`query Bad { viewer { id missing } }`;\nconst ok = gql`query Ok { field }`;";
    let results = extract("src/a.ts", source);
    let output = generator().generate(&results, &load_schema()).unwrap();

    assert_eq!(output.outputs.len(), 1);
    assert_eq!(
        output.outputs[0].file_name,
        PathBuf::from("/project/src/__generated__/ok.ts")
    );

    assert_eq!(output.errors.len(), 1);
    let error = &output.errors[0];
    assert_eq!(error.message, "Cannot query field \"missing\" on type \"User\".");
    assert_eq!(error.start, source.find("missing").unwrap());
    assert_eq!(error.end, error.start + "missing".len());
    assert_eq!(error.display_location(Path::new(PROJECT_ROOT)), "src/a.ts:1:41");
}

#[test]
fn test_error_inside_interpolation_is_dropped() {
    let source = "const fields = gql`id unknownField`;\nconst q = gql`query Q { viewer { ${fields} } }`;";
    let results = extract("a.ts", source);
    assert_eq!(results[1].text, "query Q { viewer { id unknownField } }");

    let output = generator().generate(&results, &load_schema()).unwrap();
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(output.outputs.is_empty());
}

#[test]
fn test_error_after_interpolation_is_located() {
    let source = "const fields = gql`id name`;\nconst q = gql`query Q { viewer { ${fields} missing } }`;";
    let results = extract("a.ts", source);
    let output = generator().generate(&results, &load_schema()).unwrap();

    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].start, source.rfind("missing").unwrap());
    assert_eq!(output.errors[0].end, source.rfind("missing").unwrap() + 7);
}

#[test]
fn test_generation_is_deterministic() {
    let source = "const a = gql`query A($id: ID!) { user(id: $id) { id name } }`;\n\
                  const b = gql`fragment B on User { friends(first: 3) { name } }`;\n\
                  const c = gql`query C { viewer { nope } }`;";
    let results = extract("a.ts", source);
    let schema = load_schema();

    let first = generator().generate(&results, &schema).unwrap();
    let second = generator().generate(&results, &schema).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.outputs.len(), 2);
    assert_eq!(first.errors.len(), 1);
}

struct FailingCompiler;

impl DocumentCompiler for FailingCompiler {
    fn compile(
        &self,
        _document: &apollo_compiler::ast::Document,
        _schema: &Valid<Schema>,
    ) -> Result<Module, CompileError> {
        Err(CompileError::Internal("compiler crashed".to_string()))
    }
}

#[test]
fn test_internal_error_aborts_the_pass() {
    let results = extract("a.ts", "const q = gql`query Foo { field }`;");
    let generator = TypeGenerator::new(PROJECT_ROOT, FailingCompiler);

    let error = generator.generate(&results, &load_schema()).unwrap_err();
    match error {
        TypegenError::Compiler { file, message } => {
            assert_eq!(file, Path::new("/project/a.ts"));
            assert_eq!(message, "compiler crashed");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

/// Reports one codegen error at a fixed range of the literal text
struct RangeCompiler(Range<usize>);

impl DocumentCompiler for RangeCompiler {
    fn compile(
        &self,
        _document: &apollo_compiler::ast::Document,
        _schema: &Valid<Schema>,
    ) -> Result<Module, CompileError> {
        Err(CodegenError::new("bad range", self.0.clone()).into())
    }
}

#[test]
fn test_error_ending_inside_interpolation_is_dropped() {
    let source = "const fields = gql`id name`;\nconst q = gql`query Q { viewer { ${fields} } }`;";
    let results = extract("a.ts", source);
    let text = &results[1].text;
    assert_eq!(text, "query Q { viewer { id name } }");

    // Starts in the literal's own text, ends inside the spliced `fields`
    let straddling = 0..text.find("name").unwrap();
    let output = TypeGenerator::new(PROJECT_ROOT, RangeCompiler(straddling))
        .generate(&results, &load_schema())
        .unwrap();
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(output.outputs.is_empty());

    let output = TypeGenerator::new(PROJECT_ROOT, RangeCompiler(0..5))
        .generate(&results, &load_schema())
        .unwrap();
    assert_eq!(output.errors.len(), 1);
    assert_eq!(output.errors[0].start, source.find("query Q").unwrap());
    assert_eq!(output.errors[0].end, source.find("query Q").unwrap() + 5);
}

#[test]
fn test_unparsable_file_does_not_stop_extraction() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::write(root.join("broken.ts"), "const q = gql`query Broken {\n").unwrap();
    fs::write(
        root.join("good.ts"),
        "const re = /`/;\nexport const q = gql`query Good { field }`;\n",
    )
    .unwrap();

    let results = Extractor::new(ExtractConfig::default())
        .with_patterns(vec!["*.ts".to_string()])
        .with_base_path(root)
        .extract_all()
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].file_name, root.join("good.ts"));

    let output = TypeGenerator::new(root, TypeScriptCompiler::new())
        .generate(&results, &load_schema())
        .unwrap();
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(output.outputs[0].file_name, root.join("__generated__/good.ts"));
}

#[tokio::test]
async fn test_project_end_to_end() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/components")).unwrap();
    fs::write(
        root.join("schema.graphql"),
        include_str!("fixtures/schema.graphql"),
    )
    .unwrap();
    fs::write(
        root.join("src/components/profile.tsx"),
        "import { graphql } from './graphql';\n\
         export const ProfileQuery = graphql`\n  query Profile {\n    viewer {\n      name\n    }\n  }\n`;\n",
    )
    .unwrap();
    fs::write(
        root.join("src/rename.ts"),
        "export const rename = graphql`mutation RenameUser($id: ID!, $name: String!) { rename(id: $id, name: $name) { id } }`;\n",
    )
    .unwrap();

    let project: ProjectConfig = serde_json::from_value(serde_json::json!({
        "schema": "schema.graphql",
        "documents": "src/**/*.{ts,tsx}",
        "extensions": { "typegen": { "tag": "graphql", "outputExtension": ".d.ts" } }
    }))
    .unwrap();

    let schema = SchemaLoader::new(project.schema.clone())
        .with_base_path(root)
        .load()
        .await
        .unwrap();
    let results = Extractor::from_project(&project)
        .unwrap()
        .with_base_path(root)
        .extract_all()
        .unwrap();
    assert_eq!(results.len(), 2);

    let output = TypeGenerator::new(root, TypeScriptCompiler::new())
        .with_output_extension(project.typegen().unwrap().output_extension)
        .generate(&results, &schema)
        .unwrap();

    assert!(output.errors.is_empty(), "{:?}", output.errors);
    let mut names: Vec<_> = output
        .outputs
        .iter()
        .map(|file| file.file_name.strip_prefix(root).unwrap().to_path_buf())
        .collect();
    names.sort();
    assert_eq!(
        names,
        vec![
            PathBuf::from("src/__generated__/rename-user.d.ts"),
            PathBuf::from("src/components/__generated__/profile.d.ts"),
        ]
    );

    let rename = output
        .outputs
        .iter()
        .find(|file| file.file_name.ends_with("rename-user.d.ts"))
        .unwrap();
    assert!(rename.content.contains("export type RenameUserMutation = {"));
    assert!(rename
        .content
        .contains("export type RenameUserMutationVariables = {\n  id: string;\n  name: string;\n};"));
}
