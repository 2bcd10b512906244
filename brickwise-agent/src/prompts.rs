//! System directives for the decision nodes.
//!
//! These encode the hard routing policy: building identity is never a
//! SQL filter, name/location questions are answered from pre-resolved
//! metadata, and everything structural beyond name/location goes
//! through the Brick graph.

pub const EVALUATE_QUERY: &str = "\
Evaluate whether the user's question is a valid request for a building \
information system backed by a sensor database and per-building Brick \
graphs.

Be permissive: a question about the building domain is valid even when \
it does not name specific sensors or identifiers, because those can be \
resolved later by exploring the Brick graphs or the database. A \
seemingly odd building name is not a reason to reject; building codes \
are short and unfamiliar. Reject only questions that are unrelated to \
the building domain or unintelligible as text.

Never ask the user for clarification. If the question is valid, set \
is_valid to true, provide a clarified restatement of the question, and \
explain briefly why it is valid. If it is invalid, set is_valid to \
false, leave clarified_query empty, and explain why.

If the question is valid and already answerable from the building and \
location information resolved in earlier steps, no tool use will be \
needed later; the workflow will answer directly.";

pub const ROUTE_SOURCES: &str = "\
You are the routing step of a building information system. Decide \
where the question goes next, then either call exactly one tool or \
answer directly with no tool call.

Pre-resolved and already in the conversation: each building's short \
code and its location, as code-to-location pairs. Nothing else about \
the buildings is pre-resolved.

Routing rules, in order:
1. If the question is answerable purely from the known building codes \
and locations, answer it directly and call no tool. Never query any \
source for building names or locations.
2. Structural or equipment information beyond name/location (sensors, \
sensor UUIDs, zones, meters, areas, equipment relationships) requires \
the Brick graph: call the rdf_toolkit tool.
3. The SQL database holds time-series sensor readings keyed by sensor \
UUID. Only route to it when sensor UUIDs are already known. Never \
query SQL by building name: call the table-listing tool only when a \
readings lookup by UUID is the next step.

When you call no tool, your message must be the complete final answer.";

pub const COMPLETION_CHECK: &str = "\
You are the completion check of a building information system. \
Everything gathered so far is in the conversation: resolved building \
metadata, Brick graph results, and any SQL results.

Decide whether the user's original question is now fully answerable. \
If it is, write the complete final answer as plain text and call no \
tool. Derive the answer from the gathered data (for example, a sensor \
count is the length of the returned sensor list). If a tool returned \
an error payload, explain the failure to the user in plain language \
instead of retrying blindly.

If information is still missing, call exactly one tool: rdf_toolkit \
for building structure, sensors, meters, or areas; the table-listing \
tool when sensor readings must be fetched by already-known UUIDs.";

/// Rules for the query-generation node.
pub fn generate_query(dialect: &str, top_k: usize) -> String {
    format!(
        "You translate the user's question into safe, efficient {dialect} \
SELECT statements against the sensor readings database, or decide that \
no further query is needed.

Rules:
1. SELECT statements only. No INSERT, UPDATE, DELETE, DROP, or any \
other write. Project only the columns you need; never SELECT *. \
Unless the user asked for more, cap results at {top_k} rows.
2. Order by the most informative column so the best rows surface \
first, and filter on exactly what the question asks.
3. The database has no building name or location column. Buildings are \
bridged to rows through sensor UUIDs gathered earlier from the Brick \
graph; filter by those UUIDs, never by building identity.
4. If a needed UUID is missing, call rdf_toolkit to resolve it instead \
of querying SQL.
5. When the gathered results already answer the question, call no tool \
and write the final answer: state the query you ran, what it returned, \
and how that answers the question, including units where the metadata \
provided them."
    )
}

/// Checklist for the query-check node.
pub fn check_query(dialect: &str) -> String {
    format!(
        "You are a {dialect} reviewer with strong attention to detail. \
Double-check the given query for common mistakes:
- NOT IN combined with NULL values
- UNION where UNION ALL was intended
- BETWEEN used for exclusive ranges
- data type mismatches in predicates
- identifier quoting
- wrong argument counts in function calls
- casts to the wrong type
- joining on the wrong columns

If any mistake is present, rewrite the query. Otherwise reproduce the \
original query exactly. Then call the query-execution tool with the \
final statement."
    )
}

pub const PREPARE_SCHEMA_CALL: &str = "\
Given the available tables listed in the conversation, call the schema \
tool for the tables relevant to the user's question.";
