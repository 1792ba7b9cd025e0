//! Payloads captured from Azure DevOps service hooks.

pub const PULL_REQUEST_UPDATED: &str = r#"{
  "subscriptionId": "00000000-0000-0000-0000-000000000000",
  "notificationId": 21,
  "id": "af07be1b-f3ad-44c8-a7f1-c4835f2df06b",
  "eventType": "git.pullrequest.updated",
  "publisherId": "tfs",
  "message": {
    "text": "Jamal Hartnett marked the pull request as completed"
  },
  "resource": {
    "repository": {
      "id": "4bc14d40-c903-45e2-872e-0462c7748079",
      "name": "Fabrikam",
      "url": "https://dev.azure.com/fabrikam/DefaultCollection/_apis/repos/git/repositories/4bc14d40-c903-45e2-872e-0462c7748079",
      "project": {
        "id": "6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
        "name": "DefaultCollection",
        "url": "https://dev.azure.com/fabrikam/DefaultCollection/_apis/projects/6ce954b1-ce1f-45d1-b94d-e6bf2464ba2c",
        "state": "wellFormed"
      },
      "defaultBranch": "refs/heads/main",
      "remoteUrl": "https://dev.azure.com/fabrikam/DefaultCollection/_git/Fabrikam"
    },
    "pullRequestId": 1,
    "status": "completed",
    "createdBy": {
      "displayName": "Jamal Hartnett",
      "uniqueName": "fabrikamfiber4@hotmail.com"
    },
    "creationDate": "2014-06-17T16:55:46.589889Z",
    "closedDate": "2014-06-30T18:59:12.3660573Z",
    "title": "my first pull request",
    "description": " - test2\r\n",
    "sourceRefName": "refs/heads/mytopic",
    "targetRefName": "refs/heads/main",
    "mergeStatus": "succeeded"
  },
  "resourceVersion": "1.0",
  "createdDate": "2014-06-17T16:55:46.589889Z"
}"#;

/// Same event with a different pull request status.
pub fn pull_request_with_status(status: &str) -> String {
    PULL_REQUEST_UPDATED.replace(r#""status": "completed""#, &format!(r#""status": "{status}""#))
}
