//! MCP tool definitions for the SÚKL server

use once_cell::sync::Lazy;
use serde_json::json;

use super::protocol::ToolDefinition;

pub const SEARCH_MEDICINE: &str = "search-medicine";
pub const GET_MEDICINE_DETAILS: &str = "get-medicine-details";
pub const CHECK_AVAILABILITY: &str = "check-availability";
pub const FIND_PHARMACIES: &str = "find-pharmacies";
pub const GET_ATC_INFO: &str = "get-atc-info";
pub const GET_REIMBURSEMENT: &str = "get-reimbursement";
pub const GET_PIL_CONTENT: &str = "get-pil-content";
pub const GET_SPC_CONTENT: &str = "get-spc-content";
pub const BATCH_CHECK_AVAILABILITY: &str = "batch-check-availability";

/// All tool definitions: name, description, input JSON Schema
pub const TOOL_DEFINITIONS: &[(&str, &str, &str)] = &[
    (
        SEARCH_MEDICINE,
        "Vyhledávání léčiv v české databázi SÚKL. Podporuje fuzzy vyhledávání podle názvu léku, účinné látky nebo SÚKL kódu.",
        r#"{
            "type": "object",
            "properties": {
                "query": {"type": "string", "maxLength": 200, "description": "Vyhledávací dotaz: název léku, účinná látka nebo SÚKL kód (min. 2 znaky)"},
                "limit": {"type": "number", "minimum": 1, "maximum": 100, "default": 20, "description": "Maximální počet výsledků (výchozí: 20, rozsah: 1–100)"}
            },
            "required": ["query"]
        }"#,
    ),
    (
        GET_MEDICINE_DETAILS,
        "Získání detailních informací o léčivém přípravku podle SÚKL kódu. Vrací registrační údaje, lékovou formu, účinné látky a držitele registrace.",
        r#"{
            "type": "object",
            "properties": {
                "sukl_code": {"type": "string", "maxLength": 20, "description": "SÚKL kód léku (např. '0254045')"}
            },
            "required": ["sukl_code"]
        }"#,
    ),
    (
        CHECK_AVAILABILITY,
        "Kontrola dostupnosti léčivého přípravku na trhu. Vrací informace o aktuální dostupnosti, případných výpadcích a očekávaném datu obnovení.",
        r#"{
            "type": "object",
            "properties": {
                "sukl_code": {"type": "string", "maxLength": 20, "description": "SÚKL kód léku ke kontrole"}
            },
            "required": ["sukl_code"]
        }"#,
    ),
    (
        FIND_PHARMACIES,
        "Vyhledání lékáren v České republice. Filtrování podle města, PSČ nebo nepřetržitého provozu.",
        r#"{
            "type": "object",
            "properties": {
                "city": {"type": "string", "maxLength": 100, "description": "Název města (např. 'Praha', 'Brno')"},
                "postal_code": {"type": "string", "maxLength": 10, "description": "PSČ nebo jeho prefix (např. '110' pro Prahu 1)"},
                "is_24h": {"type": "boolean", "description": "Filtrovat pouze lékárny s nepřetržitým provozem"}
            }
        }"#,
    ),
    (
        GET_ATC_INFO,
        "Informace o ATC (Anatomicko-terapeuticko-chemická) klasifikaci léčiv. ATC systém kategorizuje léčiva podle terapeutického využití.",
        r#"{
            "type": "object",
            "properties": {
                "atc_code": {"type": "string", "maxLength": 10, "description": "ATC kód (např. 'N02BE01' pro paracetamol, 'C' pro kardiovaskulární)"},
                "include_medicines": {"type": "boolean", "default": false, "description": "Zahrnout seznam léčiv v dané ATC skupině (výchozí: false)"},
                "medicines_limit": {"type": "number", "minimum": 1, "maximum": 100, "default": 20, "description": "Maximální počet léčiv v seznamu (výchozí: 20)"}
            },
            "required": ["atc_code"]
        }"#,
    ),
    (
        GET_REIMBURSEMENT,
        "Informace o úhradě a cenách léčivého přípravku. Vrací maximální cenu, výši úhrady, doplatek pacienta a podmínky úhrady.",
        r#"{
            "type": "object",
            "properties": {
                "sukl_code": {"type": "string", "maxLength": 20, "description": "SÚKL kód léku"}
            },
            "required": ["sukl_code"]
        }"#,
    ),
    (
        GET_PIL_CONTENT,
        "Příbalový leták (PIL) léčivého přípravku. Obsahuje informace pro pacienty o užívání, dávkování, nežádoucích účincích a kontraindikacích.",
        r#"{
            "type": "object",
            "properties": {
                "sukl_code": {"type": "string", "maxLength": 20, "description": "SÚKL kód léku"}
            },
            "required": ["sukl_code"]
        }"#,
    ),
    (
        GET_SPC_CONTENT,
        "Souhrn údajů o přípravku (SPC/SmPC). Odborný dokument pro zdravotnické pracovníky s farmakologickými vlastnostmi a klinickými údaji.",
        r#"{
            "type": "object",
            "properties": {
                "sukl_code": {"type": "string", "maxLength": 20, "description": "SÚKL kód léku"}
            },
            "required": ["sukl_code"]
        }"#,
    ),
    (
        BATCH_CHECK_AVAILABILITY,
        "Hromadná kontrola dostupnosti více léčivých přípravků najednou. Užitečné pro kontrolu celé medikace pacienta.",
        r#"{
            "type": "object",
            "properties": {
                "sukl_codes": {"type": "array", "items": {"type": "string"}, "maxItems": 200, "description": "Pole SÚKL kódů ke kontrole (zpracuje se prvních 50)"}
            },
            "required": ["sukl_codes"]
        }"#,
    ),
];

static DEFINITIONS: Lazy<Vec<ToolDefinition>> = Lazy::new(|| {
    TOOL_DEFINITIONS
        .iter()
        .map(|(name, description, schema)| ToolDefinition {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: serde_json::from_str(schema).unwrap_or(json!({})),
        })
        .collect()
});

/// Get all tool definitions as ToolDefinition structs
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    DEFINITIONS.clone()
}

/// Look up one tool by name
pub fn find_tool(name: &str) -> Option<&'static ToolDefinition> {
    DEFINITIONS.iter().find(|tool| tool.name == name)
}
