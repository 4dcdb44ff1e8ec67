//! # 通知ディスパッチャー ライブラリ
//!
//! 通知ディスパッチャーの設定・ユースケース・ハンドラを公開する。
//! テスト用に内部モジュールへのアクセスを提供する。

pub mod config;
pub mod error;
pub mod handler;
pub mod usecase;
