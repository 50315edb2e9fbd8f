// ==========================================
// 考试材料发放追踪系统 - 材料导入API
// ==========================================
// 职责: 上传请求校验 → 调用导入器 → 组装响应
// 红线: 任一请求校验失败时不调用导入器
// ==========================================

use crate::api::error::{ApiError, ApiResult, FieldErrors};
use crate::config::ImportConfigReader;
use crate::domain::material::ImportReport;
use crate::domain::types::FileKind;
use crate::importer::{ImportOptions, MaterialImporter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// 上传请求（由传输层从 multipart 表单中提取）
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// 客户端原始文件名（用于判断扩展名）
    pub file_name: Option<String>,
    /// 文件内容；None 表示未上传文件
    pub content: Option<Vec<u8>>,
    /// 批次阶段
    pub stage: Option<String>,
    /// 覆盖模式原始值
    pub replace_mode: Option<String>,
}

/// 导入结果数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(flatten)]
    pub report: ImportReport,
    /// 错误信息被截断时的提示
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
}

/// 导入API响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportApiResponse {
    pub message: String,
    pub data: ImportSummary,
}

impl ImportApiResponse {
    pub fn from_report(report: ImportReport) -> Self {
        let message = if report.is_truncated() {
            Some(format!(
                "Some rows were skipped. Showing first {} errors.",
                report.errors.len()
            ))
        } else {
            None
        };
        Self {
            message: "Excel file processed successfully".to_string(),
            data: ImportSummary { report, message },
        }
    }
}

/// 覆盖模式解析：仅 "1" / "true" 视为开启，其余一律关闭
pub fn parse_replace_mode(raw: Option<&str>) -> bool {
    matches!(raw, Some("1") | Some("true"))
}

// ==========================================
// ImportApi - 导入API
// ==========================================
pub struct ImportApi {
    importer: Arc<dyn MaterialImporter>,
    config: Arc<dyn ImportConfigReader>,
}

impl ImportApi {
    pub fn new(importer: Arc<dyn MaterialImporter>, config: Arc<dyn ImportConfigReader>) -> Self {
        Self { importer, config }
    }

    /// 导入上传文件
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): processed / skipped / 前 N 条错误
    /// - Err(RequestValidation): 请求不合法，未做任何修改
    /// - Err(其他): 见 ApiError::code()
    pub fn upload(&self, request: UploadRequest) -> ApiResult<ImportApiResponse> {
        let (content, kind, options) = self.validate_request(request)?;

        info!(
            kind = ?kind,
            size = content.len(),
            stage = ?options.stage,
            replace_mode = options.replace_mode,
            "收到导入请求"
        );

        let report = self.importer.import_file(&content, kind, &options)?;
        Ok(ImportApiResponse::from_report(report))
    }

    /// 请求校验：收集全部字段错误后一次性返回
    fn validate_request(&self, request: UploadRequest) -> ApiResult<(Vec<u8>, FileKind, ImportOptions)> {
        let max_upload_bytes = self.config.max_upload_bytes()?;
        let max_stage_length = self.config.max_stage_length()?;

        let mut errors = FieldErrors::new();
        let kind = request.file_name.as_deref().and_then(FileKind::from_file_name);

        match &request.content {
            None => push_error(&mut errors, "file", "The file field is required.".to_string()),
            Some(content) => {
                if kind.is_none() {
                    push_error(
                        &mut errors,
                        "file",
                        "The file must be a file of type: xlsx, xls, csv.".to_string(),
                    );
                }
                if content.len() as u64 > max_upload_bytes {
                    push_error(
                        &mut errors,
                        "file",
                        format!(
                            "The file may not be greater than {} kilobytes.",
                            max_upload_bytes / 1024
                        ),
                    );
                }
            }
        }

        // 按去除首尾空白后的长度校验，与实际存储的值一致
        if let Some(stage) = &request.stage {
            if stage.trim().chars().count() > max_stage_length {
                push_error(
                    &mut errors,
                    "stage",
                    format!("The stage may not be greater than {} characters.", max_stage_length),
                );
            }
        }

        match (request.content, kind) {
            (Some(content), Some(kind)) if errors.is_empty() => {
                let options = ImportOptions {
                    stage: request.stage,
                    replace_mode: parse_replace_mode(request.replace_mode.as_deref()),
                };
                Ok((content, kind, options))
            }
            _ => {
                warn!(?errors, file_name = ?request.file_name, "上传请求校验失败");
                Err(ApiError::RequestValidation {
                    message: "File validation error".to_string(),
                    errors,
                })
            }
        }
    }
}

fn push_error(errors: &mut FieldErrors, field: &str, reason: String) {
    errors.entry(field.to_string()).or_default().push(reason);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportLimits;
    use crate::domain::types::CellTable;
    use crate::importer::ImportResult;
    use std::sync::Mutex;

    /// 记录调用参数的导入器
    #[derive(Default)]
    struct RecordingImporter {
        calls: Mutex<Vec<(FileKind, ImportOptions)>>,
    }

    impl MaterialImporter for RecordingImporter {
        fn import_file(&self, _bytes: &[u8], kind: FileKind, options: &ImportOptions) -> ImportResult<ImportReport> {
            self.calls.lock().unwrap().push((kind, options.clone()));
            Ok(ImportReport::from_rejections(1, Vec::new(), 20))
        }

        fn import_table(&self, _table: &CellTable, _options: &ImportOptions) -> ImportResult<ImportReport> {
            unreachable!("上传接口只调用 import_file")
        }
    }

    fn api() -> (ImportApi, Arc<RecordingImporter>) {
        let importer = Arc::new(RecordingImporter::default());
        let limits = ImportLimits {
            max_upload_bytes: 16,
            ..ImportLimits::default()
        };
        (ImportApi::new(importer.clone(), Arc::new(limits)), importer)
    }

    fn request(file_name: &str, content: &[u8]) -> UploadRequest {
        UploadRequest {
            file_name: Some(file_name.to_string()),
            content: Some(content.to_vec()),
            ..UploadRequest::default()
        }
    }

    #[test]
    fn test_replace_mode_parsing() {
        assert!(parse_replace_mode(Some("1")));
        assert!(parse_replace_mode(Some("true")));
        assert!(!parse_replace_mode(Some("TRUE")));
        assert!(!parse_replace_mode(Some("yes")));
        assert!(!parse_replace_mode(Some("0")));
        assert!(!parse_replace_mode(None));
    }

    #[test]
    fn test_upload_passes_options_to_importer() {
        let (api, importer) = api();
        let mut req = request("batch.CSV", b"a,b");
        req.stage = Some("S1".to_string());
        req.replace_mode = Some("1".to_string());

        let response = api.upload(req).unwrap();
        assert_eq!(response.message, "Excel file processed successfully");
        assert_eq!(response.data.report.processed, 1);
        assert_eq!(response.data.message, None);

        let calls = importer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, FileKind::Csv);
        assert_eq!(calls[0].1.stage.as_deref(), Some("S1"));
        assert!(calls[0].1.replace_mode);
    }

    #[test]
    fn test_rejected_requests_never_reach_importer() {
        let (api, importer) = api();

        let cases = vec![
            UploadRequest::default(),
            request("notes.pdf", b"abc"),
            request("big.xlsx", &[0u8; 17]),
            UploadRequest {
                stage: Some("x".repeat(101)),
                ..request("ok.csv", b"abc")
            },
        ];

        for req in cases {
            let err = api.upload(req).unwrap_err();
            assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");
        }
        assert!(importer.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stage_length_ignores_surrounding_whitespace() {
        let (api, importer) = api();

        let padded = format!("  {}  ", "s".repeat(100));
        let req = UploadRequest {
            stage: Some(padded.clone()),
            ..request("ok.csv", b"abc")
        };
        api.upload(req).unwrap();

        let req = UploadRequest {
            stage: Some(format!(" {} ", "s".repeat(101))),
            ..request("ok.csv", b"abc")
        };
        let err = api.upload(req).unwrap_err();
        assert_eq!(err.code(), "REQUEST_VALIDATION_ERROR");

        let calls = importer.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1.stage.as_deref(), Some(padded.as_str()));
    }

    #[test]
    fn test_validation_collects_every_field() {
        let (api, _) = api();
        let req = UploadRequest {
            stage: Some("x".repeat(101)),
            ..request("big.doc", &[0u8; 17])
        };
        match api.upload(req).unwrap_err() {
            ApiError::RequestValidation { errors, .. } => {
                assert_eq!(errors["file"].len(), 2);
                assert_eq!(errors["stage"].len(), 1);
            }
            other => panic!("期望 RequestValidation，实际: {:?}", other),
        }
    }

    #[test]
    fn test_truncated_report_message() {
        let rejections: Vec<String> = (0..25).map(|i| format!("Row {}: Missing Hall", i + 2)).collect();
        let response = ImportApiResponse::from_report(ImportReport::from_rejections(0, rejections, 20));

        assert_eq!(
            response.data.message.as_deref(),
            Some("Some rows were skipped. Showing first 20 errors.")
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["data"]["total_errors"], 25);
        assert_eq!(value["data"]["errors"].as_array().unwrap().len(), 20);
    }
}
