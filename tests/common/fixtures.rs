use loadplan::AuxiliaryFile;

/// One thread group `TG1` posting `{"uid": "abc"}` from request `R1`, with a
/// data set over `users.csv`.
pub const USER_SCENARIO: &str = r#"
[TestPlan: Scenario]

[ThreadGroup: TG1]
numThreads = 2

[CsvDataSet: Users]
filename = users.csv
variableNames = uid

[HttpRequest: R1]
method = POST
domain = api.example.com
path = /users
body = {"uid": "abc"}
"#;

/// A larger plan touching every block type.
pub const CHECKOUT: &str = r#"
// Checkout journey
[TestPlan: Checkout]
comments = nightly regression
var.BASE = /api

[HTTP Request Defaults: Defaults]
domain = shop.example.com
protocol = https

[Headers: Common]
Accept = application/json

[Random Variable: Basket]
variableName = basketId
minimum = 1000
maximum = 9999

[ThreadGroup: Shoppers]
numThreads = ${__P(threads,20)}
rampTime = 10
duration = 300

[CSV Data Set: Customers]
filename = uploads/customers.csv

[Response Assertion: Healthy]
field = response_code
pattern = 200

[HttpRequest: Browse]
path = ${BASE}/products

[HttpRequest: Add to cart]
path = ${BASE}/cart
body = """
{
    "customer": "C-100",
    "items": [{"sku": "A-1", "qty": 2}]
}
"""

[Assertion: Added]
pattern = added
pattern.2 = cart
or = true

[HttpRequest: Pay]
path = ${BASE}/pay
bodyFile = payment.json

[View Results Tree: Debug]
parent = Shoppers

[Summary Report: Stats]
parent = Checkout
"#;

pub fn csv(filename: &str, content: &str) -> AuxiliaryFile {
    AuxiliaryFile::new(filename, content)
}

pub fn users_csv() -> AuxiliaryFile {
    csv("users.csv", "uid\nabc\ndef\n")
}

pub fn checkout_files() -> Vec<AuxiliaryFile> {
    vec![
        csv("customers.csv", "customer,email\nC-100,ann@example.com\nC-200,bob@example.com\n"),
        AuxiliaryFile::new("payment.json", "{\"card\": \"${card}\"}"),
    ]
}
